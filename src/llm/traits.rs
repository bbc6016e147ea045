// Text generation capability: the swap-ready abstraction.
//
// Everything that talks to a language model goes through this trait. The
// crate ships no network client: callers plug in their own provider, and
// tests plug in scripted doubles.

use anyhow::Result;
use async_trait::async_trait;

/// "Given a prompt, return a text completion."
///
/// Output is untrusted. It may be prose, malformed JSON or nothing useful
/// at all; callers run it through `extract` before relying on it.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;
}

#[async_trait]
impl<G: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<G> {
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        (**self).complete(prompt, max_output_tokens).await
    }
}
