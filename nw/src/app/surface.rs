//! Browser surfaces the feedback app reaches outside its own document

/// Opens URLs in a new browsing context
pub trait Navigator: Send + Sync {
    fn open_new_context(&self, url: &str);
}

/// Shows a blocking message to the user
pub trait Prompter: Send + Sync {
    fn alert(&self, message: &str);
}
