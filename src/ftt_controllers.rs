// Controllers for the train tracker application
use crate::ftt_config::FTTConfig;
use crate::ftt_gui;
use crate::ftt_models::HttpFeedSource;
use crate::ftt_poller::FeedPoller;
use crate::ftt_state::ViewStore;
use crate::ftt_views::FTTViews;
use anyhow::{Context, Result, anyhow};
use log::info;
use std::io::{self, Write};
use std::time::Duration;
use tokio::runtime::Builder;

pub struct FTTControllers;

impl FTTControllers {
    /// Start polling and hand control to the window or the console loop.
    pub fn run(config: FTTConfig) -> Result<()> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("ftt-worker")
            .enable_all()
            .build()
            .context("Failed to start the async runtime")?;

        let store = ViewStore::new(config.viewport, config.region);
        let source = HttpFeedSource::new(&config)?;
        info!("Polling {}", source.url());
        let poller = FeedPoller::start(runtime.handle(), source, store.clone(), config.poll_interval);

        if config.console {
            FTTViews::show_welcome_screen(&config);
            runtime.block_on(Self::run_console(store, poller));
        } else {
            ftt_gui::run_gui(store, poller, &config).map_err(|e| anyhow!("Failed to open window: {}", e))?;
        }

        Ok(())
    }

    /// Reprint the train list after every feed tick until Ctrl-C.
    async fn run_console(store: ViewStore, mut poller: FeedPoller) {
        let mut last_revision = 0;
        let mut check = tokio::time::interval(Duration::from_millis(250));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => break,
                _ = check.tick() => {
                    let snapshot = store.snapshot();
                    if snapshot.revision != last_revision {
                        last_revision = snapshot.revision;
                        Self::clear_screen();
                        FTTViews::show_train_list(&snapshot);
                    }
                }
            }
        }

        poller.stop();
        FTTViews::goodbye_message();
    }

    /// Clear screen (cross-platform)
    fn clear_screen() {
        // ANSI escape sequence to clear screen and move cursor to top-left
        print!("\x1B[2J\x1B[1;1H");
        let _ = io::stdout().flush();
    }
}
