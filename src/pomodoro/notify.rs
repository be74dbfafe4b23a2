use tracing::info;

/// Receives phase change announcements. Desktop notifications live outside of this crate, the
/// terminal implementation just prints.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier {
    fn notify(&self, title: &str, body: &str);
}

pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, title: &str, body: &str) {
        info!("Notification {title}: {body}");
        // BEL makes most terminals flash or beep.
        println!("\x07{title}: {body}");
    }
}
