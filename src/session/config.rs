// ABOUTME: Session configuration - credentials, timers, injectable capabilities
// ABOUTME: Builder-style with_* methods over protocol defaults

use crate::connection::{Dialer, TcpDialer};
use crate::datatypes::{
    AddressRange, FixedStringError, NumericPlanIndicator, Password, SystemId, SystemType,
    TypeOfNumber,
};
use crate::pdu::Pdu;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Inbound PDU callback. Runs on the reader task: it must hand work off
/// instead of blocking, or the whole session stalls.
pub type PduHandler = Arc<dyn Fn(Pdu) + Send + Sync>;

/// Injectable submission throttle. `acquire` suspends until one request
/// may proceed; dropping the future releases nothing (no token was taken).
pub trait RateLimiter: Send + Sync {
    fn acquire(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Everything a session needs to reach and authenticate with an SMSC.
///
/// ```no_run
/// use esme::session::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::new("smsc.example.net:2775", "client01", "secret")
///     .unwrap()
///     .with_system_type("VMS")
///     .unwrap()
///     .with_window_size(16)
///     .with_response_timeout(Duration::from_secs(2));
/// ```
#[derive(Clone)]
pub struct SessionConfig {
    pub(crate) dialer: Arc<dyn Dialer>,
    pub(crate) system_id: SystemId,
    pub(crate) password: Password,
    pub(crate) system_type: SystemType,
    pub(crate) addr_ton: TypeOfNumber,
    pub(crate) addr_npi: NumericPlanIndicator,
    pub(crate) address_range: AddressRange,
    pub(crate) enquire_link_period: Duration,
    pub(crate) enquire_link_timeout: Option<Duration>,
    pub(crate) response_timeout: Duration,
    pub(crate) window_size: usize,
    pub(crate) rate_limiter: Option<Arc<dyn RateLimiter>>,
    pub(crate) merge_long_messages: bool,
    pub(crate) merge_check_interval: Duration,
    pub(crate) merge_stale_ttl: Duration,
    pub(crate) handler: Option<PduHandler>,
}

impl SessionConfig {
    /// Plain-TCP configuration. Fails when a credential exceeds its wire
    /// limit (system_id 15, password 8, system_type 12 content octets).
    pub fn new(
        smsc_addr: impl Into<String>,
        system_id: &str,
        password: &str,
    ) -> Result<Self, FixedStringError> {
        Ok(Self {
            dialer: Arc::new(TcpDialer::new(smsc_addr)),
            system_id: SystemId::new(system_id)?,
            password: Password::new(password)?,
            system_type: SystemType::default(),
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: AddressRange::default(),
            enquire_link_period: Duration::from_secs(10),
            enquire_link_timeout: None,
            response_timeout: Duration::from_secs(1),
            window_size: 0,
            rate_limiter: None,
            merge_long_messages: true,
            merge_check_interval: Duration::from_secs(1),
            merge_stale_ttl: Duration::from_secs(5 * 60),
            handler: None,
        })
    }

    /// Replace the default TCP dialer. This is the seam for TLS, proxies
    /// or any other transport wrapper.
    pub fn with_dialer(mut self, dialer: Arc<dyn Dialer>) -> Self {
        self.dialer = dialer;
        self
    }

    pub fn with_system_type(mut self, system_type: &str) -> Result<Self, FixedStringError> {
        self.system_type = SystemType::new(system_type)?;
        Ok(self)
    }

    pub fn with_address_range(
        mut self,
        ton: TypeOfNumber,
        npi: NumericPlanIndicator,
        range: &str,
    ) -> Result<Self, FixedStringError> {
        self.addr_ton = ton;
        self.addr_npi = npi;
        self.address_range = AddressRange::new(range)?;
        Ok(self)
    }

    /// Keepalive probe period. The liveness timeout stays at three periods
    /// unless [`Self::with_enquire_link_timeout`] pins it.
    pub fn with_enquire_link_period(mut self, period: Duration) -> Self {
        self.enquire_link_period = period;
        self
    }

    pub fn with_enquire_link_timeout(mut self, timeout: Duration) -> Self {
        self.enquire_link_timeout = Some(timeout);
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Maximum simultaneously outstanding requests; 0 means unbounded.
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    /// Toggle inbound long-message reassembly. When off, every UDH part
    /// reaches the handler exactly as it arrived.
    pub fn with_long_message_merge(mut self, merge: bool) -> Self {
        self.merge_long_messages = merge;
        self
    }

    pub fn with_merge_check_interval(mut self, interval: Duration) -> Self {
        self.merge_check_interval = interval;
        self
    }

    pub fn with_merge_stale_ttl(mut self, ttl: Duration) -> Self {
        self.merge_stale_ttl = ttl;
        self
    }

    /// Inbound PDU callback for receiver-capable sessions.
    pub fn with_handler(mut self, handler: PduHandler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub(crate) fn effective_enquire_link_timeout(&self) -> Duration {
        self.enquire_link_timeout
            .unwrap_or(self.enquire_link_period * 3)
    }
}
