//! Captcha solving.
//!
//! The search form carries an image challenge. How it is solved (a person at
//! a prompt, an OCR model, a remote service) is outside the workflow: it only
//! hands over the image bytes and gets back an optional code. `None` means
//! "skip this attempt"; the form is then submitted with an empty code and the
//! retry loop treats the resulting captcha rejection like any other.

use std::path::PathBuf;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Turns a captcha image into a code.
///
/// A booking session awaits its solver inline on one task, so the returned
/// future carries no `Send` bound.
#[allow(async_fn_in_trait)]
pub trait CaptchaSolver {
    async fn solve(&self, image: &[u8]) -> Option<String>;
}

/// Adapter that lets a plain function act as a [`CaptchaSolver`].
pub struct FnSolver<F>(F);

/// Wrap a function as a [`CaptchaSolver`].
///
/// ```
/// use train_booker::captcha::solver_fn;
///
/// let solver = solver_fn(|_image: &[u8]| Some("AB12".to_string()));
/// # let _ = solver;
/// ```
pub fn solver_fn<F>(f: F) -> FnSolver<F>
where
    F: Fn(&[u8]) -> Option<String>,
{
    FnSolver(f)
}

impl<F> CaptchaSolver for FnSolver<F>
where
    F: Fn(&[u8]) -> Option<String>,
{
    async fn solve(&self, image: &[u8]) -> Option<String> {
        (self.0)(image).as_deref().and_then(normalize_code)
    }
}

/// Solver that saves the image to disk and asks on the terminal.
///
/// An empty line skips the attempt. One reader is kept for the whole
/// session, so lines typed ahead are answered in order.
pub struct PromptSolver<I = BufReader<Stdin>> {
    image_path: PathBuf,
    input: Mutex<I>,
}

impl PromptSolver {
    /// Read codes from standard input.
    pub fn new(image_path: impl Into<PathBuf>) -> Self {
        Self::with_input(image_path, BufReader::new(tokio::io::stdin()))
    }
}

impl<I> PromptSolver<I>
where
    I: AsyncBufRead + Unpin,
{
    /// Read codes from `input`, one per line.
    pub fn with_input(image_path: impl Into<PathBuf>, input: I) -> Self {
        Self {
            image_path: image_path.into(),
            input: Mutex::new(input),
        }
    }
}

impl<I> CaptchaSolver for PromptSolver<I>
where
    I: AsyncBufRead + Unpin,
{
    async fn solve(&self, image: &[u8]) -> Option<String> {
        if let Err(e) = tokio::fs::write(&self.image_path, image).await {
            warn!(path = %self.image_path.display(), error = %e, "Failed to save captcha image");
            return None;
        }
        info!(path = %self.image_path.display(), bytes = image.len(), "Captcha image saved");

        let mut stderr = tokio::io::stderr();
        let _ = stderr.write_all(b"Captcha code (empty to skip): ").await;
        let _ = stderr.flush().await;

        let mut line = String::new();
        let mut input = self.input.lock().await;
        match input.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => normalize_code(&line),
            Err(e) => {
                warn!(error = %e, "Failed to read captcha code");
                None
            }
        }
    }
}

/// Trim a code; blank codes count as no code.
pub fn normalize_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}
