use crate::{
    config::Config,
    env::EnvContext,
    installer::{installer_for, InstallContext, InstallOutcome},
    operator::Operator,
    platform::PlatformProfile,
    probe::{ProbeStatus, Prober},
    tool::ToolRequirement,
    util::HttpClient,
};

/// Makes sure every required tool is usable before any download starts.
pub struct Provisioner<'a> {
    pub platform: PlatformProfile,
    pub prober: &'a dyn Prober,
    pub operator: &'a dyn Operator,
    pub env: &'a mut dyn EnvContext,
    pub client: &'a HttpClient,
    pub config: &'a Config,
}

impl Provisioner<'_> {
    /// Check `requirements` in order, installing what is missing with the
    /// operator's consent. Stops at the first required tool that cannot be
    /// made available.
    pub async fn ensure_ready(&mut self, requirements: &[ToolRequirement]) -> bool {
        for tool in requirements {
            if !self.ensure_tool(tool).await {
                info!("{} is not available, aborting", tool.name);
                return false;
            }
        }
        true
    }

    async fn probe(&self, tool: &ToolRequirement) -> ProbeStatus {
        self.prober.probe(tool, &self.env.search_path()).await
    }

    async fn ensure_tool(&mut self, tool: &ToolRequirement) -> bool {
        self.operator
            .show_message(&format!("Checking for {}...", tool.name));

        let broken = match self.probe(tool).await {
            ProbeStatus::Present { version } => {
                self.operator.show_message(&format!(
                    "✓ {} is already installed (version: {})",
                    tool.name, version
                ));
                return true;
            }
            ProbeStatus::Absent => {
                info!("{} not found on search path", tool.name);
                false
            }
            ProbeStatus::Broken { reason } => {
                warn!("{} found but not working: {}", tool.name, reason);
                self.operator.show_message(&format!(
                    "{} was found but does not respond correctly ({}).",
                    tool.name, reason
                ));
                true
            }
        };

        if !tool.required {
            self.operator
                .show_message(&format!("{} not found, continuing without it.", tool.name));
            return true;
        }

        let question = format!(
            "\n{} is required but it's not available on your system.\nWould you like to install {} now?",
            tool.name, tool.name
        );
        if !self.operator.ask_yes_no(&question).await {
            self.operator.show_message(&format!(
                "\n{} is required for this program to work.",
                tool.name
            ));
            return false;
        }

        let installer = installer_for(&tool.recipe, self.platform);
        let mut ctx = InstallContext {
            operator: self.operator,
            env: &mut *self.env,
            client: self.client,
            config: self.config,
            replaces_broken: broken,
        };

        match installer.install(tool, &mut ctx).await {
            InstallOutcome::Installed(dir) => {
                debug!("{} installed ({:?})", tool.name, dir);
            }
            InstallOutcome::ManualInstructionsShown => {
                self.operator.show_message(&format!(
                    "\nPlease install {} manually, then run this program again.",
                    tool.name
                ));
                return false;
            }
            InstallOutcome::Failed(reason) => {
                error!("could not install {}: {}", tool.name, reason);
                self.operator.show_message(&format!(
                    "\nCould not automatically install {}.",
                    tool.name
                ));
                return false;
            }
        }

        match self.probe(tool).await {
            ProbeStatus::Present { version } => {
                self.operator.show_message(&format!(
                    "✓ {} is ready (version: {})",
                    tool.name, version
                ));
                true
            }
            status => {
                warn!("{} still unavailable after install: {:?}", tool.name, status);
                self.operator.show_message(&format!(
                    "{} was installed but still cannot be run.",
                    tool.name
                ));
                false
            }
        }
    }
}
