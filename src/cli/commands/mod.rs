use anyhow::Result;
use kyc_wizard::wizard::{Navigator, Notification, NotificationLevel, Notifier, Route};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

pub mod config;
pub mod track;
pub mod wizard;

pub type InputLines = Lines<BufReader<Stdin>>;

pub fn stdin_lines() -> InputLines {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Print a prompt and read one trimmed line; `None` once input is closed.
pub async fn prompt(lines: &mut InputLines, message: &str) -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(message.as_bytes()).await?;
    stdout.flush().await?;
    let line = lines.next_line().await?;
    if line.is_none() {
        println!();
    }
    Ok(line.map(|line| line.trim().to_string()))
}

/// Prints notifications the way the screens show toasts
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) {
        let icon = match notification.level {
            NotificationLevel::Success => "✅",
            NotificationLevel::Info => "🔔",
            NotificationLevel::Error => "❌",
        };
        println!("{icon} {}: {}", notification.title, notification.description);
    }
}

#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: &Route) {
        println!("➡️  Navigating to {route}");
    }
}
