/// Human-facing channel of the host application (a chat window, a console, ...).
pub trait MessageReceiver: Send + Sync {
    fn send_message(&self, text: &str);
}
