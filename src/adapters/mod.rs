// Adapters layer: delivery transports behind the Notifier port.

pub mod console;
pub mod sns;

pub use console::ConsoleNotifier;
#[cfg(feature = "sns")]
pub use sns::SnsNotifier;
