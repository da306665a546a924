use std::io::{BufRead, Write};

use tokio::sync::{mpsc, Mutex};

use crate::stats;

/// The person at the terminal: answers questions, watches progress.
#[async_trait::async_trait]
pub trait Operator: Send + Sync {
    /// Ask a question; any answer other than yes counts as no.
    async fn ask_yes_no(&self, question: &str) -> bool;

    /// Ask for a line of free text, returned trimmed. `None` once input is
    /// closed.
    async fn ask_line(&self, prompt: &str) -> Option<String>;

    fn show_progress(&self, received: u64, total: Option<u64>);

    fn show_message(&self, message: &str);
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Reads answers from stdin on a dedicated thread. A read that is still
/// blocked when the program ends does not hold up runtime shutdown.
pub struct TerminalOperator {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl TerminalOperator {
    pub fn new() -> Self {
        Self::from_reader(std::io::BufReader::new(std::io::stdin()))
    }

    /// Answers come line by line from `reader`; its end closes input.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let spawned = std::thread::Builder::new()
            .name("stdin".to_string())
            .spawn(move || {
                for line in reader.lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("could not read from stdin: {}", e);
                            break;
                        }
                    }
                }
            });
        if let Err(e) = spawned {
            error!("could not start stdin reader: {}", e);
        }

        Self {
            lines: Mutex::new(rx),
        }
    }

    async fn read_line(&self) -> Option<String> {
        self.lines
            .lock()
            .await
            .recv()
            .await
            .map(|line| line.trim().to_string())
    }
}

impl Default for TerminalOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Operator for TerminalOperator {
    async fn ask_yes_no(&self, question: &str) -> bool {
        println!("{} (y/n)", question);
        print!("> ");
        let _ = std::io::stdout().lock().flush();
        self.read_line().await.map_or(false, |a| is_yes(&a))
    }

    async fn ask_line(&self, prompt: &str) -> Option<String> {
        print!("{}", prompt);
        let _ = std::io::stdout().lock().flush();
        self.read_line().await
    }

    fn show_progress(&self, received: u64, total: Option<u64>) {
        print!("\x1b[2K\r{}", stats::progress_line(received, total));
        let _ = std::io::stdout().lock().flush();
    }

    fn show_message(&self, message: &str) {
        println!("{}", message);
    }
}
