//! Sharing a class between devices.

use clap::{Args, Subcommand};

use dreamclass_core::{
    code_from_link, share_link, ChangeChannel, Classroom, EventOutcome, PushOutcome,
    Reconciliation, RemoteSettings, RowStore, ShareCode, SkipReason, SyncMode, WordCodeGenerator,
};

use super::CommandError;
use crate::app::resolve_remote;
use crate::config::Config;

#[derive(Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    pub command: SyncSubcommand,
}

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Share this class under a new class code
    Create,

    /// Join a shared class, replacing the class on this device
    Join {
        /// Class code or share link
        code: String,
    },

    /// Stop sharing; the class stays on this device
    Leave,

    /// Fetch the latest shared class now
    Refresh,

    /// Show sharing status
    Status,

    /// Print the share link for this class
    Link,

    /// Stay connected and apply changes from other devices until Ctrl-C
    Watch,

    /// Save remote store credentials on this device
    Setup {
        /// Project URL (e.g., "https://xyz.supabase.co")
        url: String,

        /// Anonymous API key
        key: String,
    },

    /// Forget remote store credentials saved on this device
    Reset,
}

impl SyncCommand {
    pub async fn run<B: RowStore + ChangeChannel>(
        &self,
        classroom: &mut Classroom<B>,
        config: &Config,
    ) -> Result<(), CommandError> {
        match &self.command {
            SyncSubcommand::Create => create(classroom, config).await,
            SyncSubcommand::Join { code } => join(classroom, config, code).await,
            SyncSubcommand::Leave => {
                match classroom.data().share_code.clone() {
                    Some(code) => {
                        classroom.disconnect()?;
                        println!("Stopped sharing class {}.", code);
                        println!("The class is still saved on this device.");
                    }
                    None => println!("This class is not shared."),
                }
                Ok(())
            }
            SyncSubcommand::Refresh => {
                match classroom.refresh_now().await? {
                    Reconciliation::Applied(stamp) => {
                        println!("✓ updated (changes from {})", stamp)
                    }
                    Reconciliation::StaleIgnored => println!("✓ up to date"),
                    Reconciliation::Skipped(reason) => print_skipped(reason),
                }
                Ok(())
            }
            SyncSubcommand::Status => status(classroom, config),
            SyncSubcommand::Link => {
                match &classroom.data().share_code {
                    Some(code) => println!("{}", share_link(&config.share_base_url.value, code)),
                    None => print_skipped(SkipReason::NoShareCode),
                }
                Ok(())
            }
            SyncSubcommand::Watch => watch(classroom).await,
            SyncSubcommand::Setup { url, key } => {
                classroom.store().save_remote_settings(&RemoteSettings {
                    url: url.trim().to_string(),
                    key: key.trim().to_string(),
                })?;
                println!("Saved remote store credentials on this device.");
                Ok(())
            }
            SyncSubcommand::Reset => {
                classroom.store().clear_remote_settings()?;
                println!("Removed remote store credentials from this device.");
                Ok(())
            }
        }
    }
}

async fn create<B: RowStore + ChangeChannel>(
    classroom: &mut Classroom<B>,
    config: &Config,
) -> Result<(), CommandError> {
    let connection = classroom.connect_new(&WordCodeGenerator).await?;

    println!("Class code: {}", connection.code);
    println!(
        "Share link: {}",
        share_link(&config.share_base_url.value, &connection.code)
    );
    if connection.mode == SyncMode::LocalOnly {
        println!();
        println!("No remote store is configured, so the code is only saved on this device.");
        println!("Run 'dreamclass sync setup <url> <key>' to share it with other devices.");
    }
    Ok(())
}

async fn join<B: RowStore + ChangeChannel>(
    classroom: &mut Classroom<B>,
    config: &Config,
    raw: &str,
) -> Result<(), CommandError> {
    let code = parse_code(raw)?;
    let connection = classroom.connect_existing(code).await?;
    let data = classroom.data();

    println!("Joined class {}", connection.code);
    println!(
        "  {} student(s), {} event(s)",
        data.students.len(),
        data.events.len()
    );
    println!(
        "Share link: {}",
        share_link(&config.share_base_url.value, &connection.code)
    );
    Ok(())
}

fn status<B: RowStore + ChangeChannel>(
    classroom: &Classroom<B>,
    config: &Config,
) -> Result<(), CommandError> {
    let status = classroom.sync_status();

    println!("Sync Status");
    println!("===========");
    println!();

    match resolve_remote(config, classroom.store())? {
        Some(remote) => println!("Remote store: {} ({})", remote.value.url, remote.source),
        None => println!("Remote store: not configured"),
    }

    match &status.share_code {
        Some(code) => {
            println!("Class code:   {}", code);
            println!(
                "Share link:   {}",
                share_link(&config.share_base_url.value, code)
            );
        }
        None => println!("Class code:   (not shared)"),
    }
    println!(
        "Last sync:    {}",
        status
            .last_sync
            .map(|s| s.to_string())
            .unwrap_or_else(|| "never".to_string())
    );
    if status.share_code.is_some() && status.mode == SyncMode::LocalOnly {
        println!();
        println!("Changes are only saved on this device until a remote store is set up.");
    }
    Ok(())
}

async fn watch<B: RowStore + ChangeChannel>(
    classroom: &mut Classroom<B>,
) -> Result<(), CommandError> {
    let connection = match classroom.resume(None).await? {
        Some(c) if c.mode == SyncMode::Remote => c,
        Some(_) => {
            println!("No remote store is configured; nothing to watch.");
            return Ok(());
        }
        None => {
            print_skipped(SkipReason::NoShareCode);
            return Ok(());
        }
    };
    println!("Watching class {} (Ctrl-C to stop)", connection.code);

    loop {
        let event = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            event = classroom.next_event() => Some(event),
        };
        let Some(event) = event else {
            break;
        };

        match classroom.handle(event).await {
            Ok(EventOutcome::Reconciled(Reconciliation::Applied(stamp))) => {
                let data = classroom.data();
                println!(
                    "✓ applied changes from {} ({} student(s), {} event(s))",
                    stamp,
                    data.students.len(),
                    data.events.len()
                );
            }
            Ok(EventOutcome::Pushed(PushOutcome::Pushed(stamp))) => {
                println!("✓ pushed changes at {}", stamp);
            }
            Ok(EventOutcome::ChannelClosed) => {
                println!("✗ connection closed by the remote store");
                break;
            }
            Ok(_) => {}
            Err(e) => println!("✗ {}", e),
        }
    }

    Ok(())
}

/// Accepts a bare class code or a share link carrying one.
fn parse_code(raw: &str) -> Result<ShareCode, CommandError> {
    code_from_link(raw)
        .or_else(|| {
            if raw.contains('?') {
                None
            } else {
                ShareCode::parse(raw).ok()
            }
        })
        .ok_or_else(|| CommandError::InvalidCode(raw.to_string()))
}

fn print_skipped(reason: SkipReason) {
    match reason {
        SkipReason::NoShareCode => {
            println!("This class is not shared. Run 'dreamclass sync create' or 'dreamclass sync join <code>'.")
        }
        SkipReason::Unconfigured => {
            println!("No remote store is configured. Run 'dreamclass sync setup <url> <key>'.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_from_code_or_link() {
        assert_eq!(parse_code(" 푸른하늘-1234 ").unwrap().as_str(), "푸른하늘-1234");
        assert_eq!(
            parse_code("https://dreamclass.app/?class=%ED%91%B8%EB%A5%B8%ED%95%98%EB%8A%98-1234")
                .unwrap()
                .as_str(),
            "푸른하늘-1234"
        );
        assert!(matches!(
            parse_code("https://dreamclass.app/?other=1"),
            Err(CommandError::InvalidCode(_))
        ));
    }
}
