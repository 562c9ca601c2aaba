pub mod async_msg_notify_scheduler;

pub use async_msg_notify_scheduler::AsyncMsgNotifyBasedScheduler;
