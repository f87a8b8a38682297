//! 扇出发布器的实现

mod centrifugo;
mod redis_pubsub;

pub use centrifugo::CentrifugoPublisher;
pub use redis_pubsub::RedisPublisher;
