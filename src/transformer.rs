use anyhow::Result;

/// The external text-transformation service.
///
/// Implementations send one system prompt and one block of user text and return the rewritten
/// text. Any error is treated as transient by the caller; empty text counts as a failed attempt.
pub trait Transformer {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}

impl<T: Transformer + ?Sized> Transformer for &T {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        (**self).complete(system_prompt, user_text)
    }
}

impl<T: Transformer + ?Sized> Transformer for Box<T> {
    fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        (**self).complete(system_prompt, user_text)
    }
}
