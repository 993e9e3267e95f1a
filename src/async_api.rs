//! Async facade over a [`Session`].
//!
//! The worker thread owns a synchronous `Session` and executes commands sent
//! from async tasks, so callers get an async interface without the session
//! being `Send`-shared across threads. Cancellation bypasses the command
//! queue: the token is shared with the export loop, so `cancel_export` takes
//! effect while an `export` call is still in flight.

use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::export::{CancelToken, ExportReport, FsSink};
use crate::markdown::MarkupRenderer;
use crate::session::{CutMode, Session, SessionConfig};
use crate::theme::ThemeTokens;

enum Command {
    SetSource(String, oneshot::Sender<Result<()>>),
    SetTheme(String, oneshot::Sender<Result<()>>),
    SetThemeTokens(String, Box<ThemeTokens>, oneshot::Sender<Result<()>>),
    ToggleCutting(oneshot::Sender<Result<CutMode>>),
    AddCutLine(u32, oneshot::Sender<Result<()>>),
    RemoveCutLine(u32, oneshot::Sender<Result<bool>>),
    ClearCutLines(oneshot::Sender<Result<()>>),
    Preview(oneshot::Sender<Result<(String, u32)>>),
    Export(PathBuf, oneshot::Sender<Result<ExportReport>>),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly editor handle backed by a dedicated worker thread.
#[derive(Clone)]
pub struct Studio {
    cmd_tx: Sender<Command>,
    cancel: CancelToken,
}

impl Studio {
    /// Create a studio with the default markdown renderer.
    #[cfg(feature = "markdown")]
    pub async fn new(config: SessionConfig) -> Result<Self> {
        Self::with_renderer(config, Box::new(crate::markdown::PulldownRenderer::default())).await
    }

    /// Create a studio around a custom markup renderer (spawns the worker
    /// thread that owns the session).
    pub async fn with_renderer(
        config: SessionConfig,
        renderer: Box<dyn MarkupRenderer>,
    ) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();

        thread::spawn(move || {
            let mut session = Session::new(config, renderer);
            let _ = init_tx.send(Ok(()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::SetSource(text, resp) => {
                        session.set_source(&text);
                        let _ = resp.send(Ok(()));
                    }
                    Command::SetTheme(name, resp) => {
                        session.set_theme(&name);
                        let _ = resp.send(Ok(()));
                    }
                    Command::SetThemeTokens(name, tokens, resp) => {
                        session.set_theme_tokens(&name, *tokens);
                        let _ = resp.send(Ok(()));
                    }
                    Command::ToggleCutting(resp) => {
                        let _ = resp.send(Ok(session.toggle_cutting()));
                    }
                    Command::AddCutLine(y, resp) => {
                        let _ = resp.send(session.add_cut_line(y));
                    }
                    Command::RemoveCutLine(y, resp) => {
                        let _ = resp.send(Ok(session.remove_cut_line(y)));
                    }
                    Command::ClearCutLines(resp) => {
                        session.clear_cut_lines();
                        let _ = resp.send(Ok(()));
                    }
                    Command::Preview(resp) => {
                        let res = session.render_preview().map(|frame| {
                            (frame.doc.inner_html(frame.root), frame.height)
                        });
                        let _ = resp.send(res);
                    }
                    Command::Export(dir, resp) => {
                        // A fresh run must not observe a cancel left over from
                        // the previous one.
                        worker_cancel.reset();
                        let mut sink = FsSink::new(dir);
                        let res = session.export(&mut sink, &worker_cancel);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))??;

        Ok(Self { cmd_tx, cancel })
    }

    pub async fn set_source(&self, text: &str) -> Result<()> {
        self.request(|tx| Command::SetSource(text.to_string(), tx))
            .await
    }

    pub async fn set_theme(&self, name: &str) -> Result<()> {
        self.request(|tx| Command::SetTheme(name.to_string(), tx))
            .await
    }

    pub async fn set_theme_tokens(&self, name: &str, tokens: ThemeTokens) -> Result<()> {
        self.request(|tx| Command::SetThemeTokens(name.to_string(), Box::new(tokens), tx))
            .await
    }

    pub async fn toggle_cutting(&self) -> Result<CutMode> {
        self.request(Command::ToggleCutting).await
    }

    pub async fn add_cut_line(&self, y: u32) -> Result<()> {
        self.request(|tx| Command::AddCutLine(y, tx)).await
    }

    pub async fn remove_cut_line(&self, y: u32) -> Result<bool> {
        self.request(|tx| Command::RemoveCutLine(y, tx)).await
    }

    pub async fn clear_cut_lines(&self) -> Result<()> {
        self.request(Command::ClearCutLines).await
    }

    /// Render the preview, returning its HTML and measured height.
    pub async fn preview(&self) -> Result<(String, u32)> {
        self.request(Command::Preview).await
    }

    /// Export into a directory; file names follow the derived document title.
    pub async fn export(&self, dir: impl Into<PathBuf>) -> Result<ExportReport> {
        let dir = dir.into();
        self.request(|tx| Command::Export(dir, tx)).await
    }

    /// Flag the in-flight export to stop at the next segment boundary.
    pub fn cancel_export(&self) {
        self.cancel.cancel();
    }

    /// Shut down the worker thread.
    pub async fn close(self) -> Result<()> {
        self.request(Command::Close).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .map_err(|_| Error::Other("Studio worker has shut down".to_string()))?;
        rx.await
            .map_err(|e| Error::Other(format!("Command canceled: {}", e)))?
    }
}
