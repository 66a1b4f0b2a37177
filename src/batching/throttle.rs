use chrono::{DateTime, Duration, Utc};

/// 发送节流：两次调用语言模型之间至少间隔 interval
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_dispatch: Option<DateTime<Utc>>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_dispatch: None,
        }
    }

    /// 超出 chrono 可表示范围时饱和为最大间隔，即首次之后不再发送
    pub fn from_secs(secs: u64) -> Self {
        Self::new(interval_from_secs(secs).unwrap_or(Duration::MAX))
    }

    /// 间隔已满足时记录本次发送时间并返回 true；从未发送过时总是允许
    pub fn try_dispatch(&mut self, now: DateTime<Utc>) -> bool {
        match self.last_dispatch {
            Some(last) if now - last < self.interval => false,
            _ => {
                self.last_dispatch = Some(now);
                true
            }
        }
    }

    /// 距离下一次允许发送的剩余时间
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        match self.last_dispatch {
            Some(last) => self
                .interval
                .checked_sub(&(now - last))
                .unwrap_or(self.interval)
                .max(Duration::zero()),
            None => Duration::zero(),
        }
    }

    #[cfg(test)]
    pub fn last_dispatch(&self) -> Option<DateTime<Utc>> {
        self.last_dispatch
    }

    #[cfg(test)]
    pub fn with_last_dispatch(mut self, last: DateTime<Utc>) -> Self {
        self.last_dispatch = Some(last);
        self
    }
}

/// 秒数转换为 chrono 间隔，超出范围返回 None
pub fn interval_from_secs(secs: u64) -> Option<Duration> {
    i64::try_from(secs).ok().and_then(Duration::try_seconds)
}
