//! Sequential VCP probing with retries

use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::{CapabilityReport, ProbeFailure, ProbeResult, Responsiveness, VendorIdentity};
use crate::display::{DisplayAccess, MonitorHandle};
use crate::settings::ProbeSettings;

/// Probes a monitor's DDC/CI channel
#[derive(Debug, Clone, Default)]
pub struct CapabilityProber {
    settings: ProbeSettings,
}

impl CapabilityProber {
    pub fn new(settings: ProbeSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe the configured code list
    pub fn probe_default<D>(&self, access: &D, handle: &MonitorHandle) -> CapabilityReport
    where
        D: DisplayAccess + ?Sized,
    {
        self.probe(access, handle, &self.settings.codes)
    }

    /// Query each code in order and classify the outcome.
    ///
    /// Codes are never queried concurrently. When a budget is set and has run
    /// out, the remaining codes are recorded as skipped.
    pub fn probe<D>(&self, access: &D, handle: &MonitorHandle, codes: &[u8]) -> CapabilityReport
    where
        D: DisplayAccess + ?Sized,
    {
        let start = Instant::now();
        let budget = self.settings.budget();
        let mut results = Vec::with_capacity(codes.len());

        for &code in codes {
            if budget.is_some_and(|b| start.elapsed() >= b) {
                trace!(handle = %handle, code = format_args!("0x{:02X}", code), "Probe budget exhausted, skipping");
                results.push(ProbeResult::skipped(code));
                continue;
            }
            results.push(self.probe_code(access, handle, code));
        }

        let responsiveness = classify(&results);
        let vendor = VendorIdentity::from_results(&results);
        let elapsed_ms = start.elapsed().as_millis() as u64;

        debug!(
            handle = %handle,
            ?responsiveness,
            codes = codes.len(),
            elapsed_ms,
            "Probe finished"
        );

        CapabilityReport {
            responsiveness,
            results,
            vendor,
            elapsed_ms,
        }
    }

    /// Query one code, retrying until success or attempts run out. The last
    /// attempt decides the outcome.
    fn probe_code<D>(&self, access: &D, handle: &MonitorHandle, code: u8) -> ProbeResult
    where
        D: DisplayAccess + ?Sized,
    {
        let attempts = self.settings.attempts.max(1);
        let delay = self.settings.retry_delay();
        let mut last_error = ProbeFailure::Unsupported;

        for attempt in 1..=attempts {
            match access.query_feature(handle, code) {
                Ok(reply) => {
                    trace!(handle = %handle, code = format_args!("0x{:02X}", code), attempt, current = reply.current, max = reply.max, "VCP reply");
                    return ProbeResult::succeeded(code, reply, attempt);
                }
                Err(err) => {
                    trace!(handle = %handle, code = format_args!("0x{:02X}", code), attempt, error = %err, "VCP query failed");
                    last_error = err.into();
                }
            }

            if attempt < attempts && delay > Duration::ZERO {
                thread::sleep(delay);
            }
        }

        if let ProbeFailure::Fault { code: fault, message } = &last_error {
            warn!(
                handle = %handle,
                code = format_args!("0x{:02X}", code),
                fault = format_args!("0x{:08X}", fault),
                %message,
                "VCP query faulted after {} attempts",
                attempts
            );
        }

        ProbeResult::failed(code, last_error, attempts)
    }
}

/// Classify a set of probe results. Skipped codes do not count.
pub fn classify(results: &[ProbeResult]) -> Responsiveness {
    let attempted: Vec<&ProbeResult> = results.iter().filter(|r| !r.is_skipped()).collect();

    if attempted.is_empty() {
        return Responsiveness::Unknown;
    }
    if attempted.iter().any(|r| r.is_fault()) {
        return Responsiveness::CommunicationError;
    }

    let succeeded = attempted.iter().filter(|r| r.success).count();
    if succeeded == attempted.len() {
        Responsiveness::FullyResponsive
    } else if succeeded == 0 {
        Responsiveness::NonResponsive
    } else {
        Responsiveness::PartiallyResponsive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::vcp;
    use crate::display::{FeatureReply, MockDisplayAccess, QueryError};
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn quick_prober() -> CapabilityProber {
        CapabilityProber::new(ProbeSettings {
            retry_delay_ms: 0,
            ..ProbeSettings::default()
        })
    }

    fn reply(current: u16, max: u16) -> FeatureReply {
        FeatureReply { current, max }
    }

    fn handle() -> MonitorHandle {
        MonitorHandle::new("mon-1")
    }

    #[test]
    fn test_all_codes_answer() {
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature()
            .times(9)
            .returning(|_, _| Ok(reply(50, 100)));

        let report = quick_prober().probe(&mock, &handle(), &vcp::DEFAULT_PROBE_CODES);
        assert_eq!(report.responsiveness, Responsiveness::FullyResponsive);
        assert_eq!(report.results.len(), 9);
        assert!(report.results.iter().all(|r| r.attempts == 1));
        assert_eq!(report.result(vcp::BRIGHTNESS).unwrap().current, Some(50));
    }

    #[test]
    fn test_no_code_answers() {
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature()
            .times(27)
            .returning(|_, _| Err(QueryError::Unsupported));

        let report = quick_prober().probe(&mock, &handle(), &vcp::DEFAULT_PROBE_CODES);
        assert_eq!(report.responsiveness, Responsiveness::NonResponsive);
        assert!(report.results.iter().all(|r| r.attempts == 3));
        assert!(report.results.iter().all(|r| r.current.is_none()));
        assert!(report.vendor.is_empty());
    }

    #[test]
    fn test_three_of_nine_answer() {
        let answering = [vcp::BRIGHTNESS, vcp::CONTRAST, vcp::POWER_MODE];
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature().returning(move |_, code| {
            if answering.contains(&code) {
                Ok(reply(1, 5))
            } else {
                Err(QueryError::Unsupported)
            }
        });

        let report = quick_prober().probe(&mock, &handle(), &vcp::DEFAULT_PROBE_CODES);
        assert_eq!(report.responsiveness, Responsiveness::PartiallyResponsive);
        assert_eq!(report.supported_codes().len(), 3);
    }

    #[test]
    fn test_final_fault_is_communication_error() {
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature().returning(|_, code| {
            if code == vcp::INPUT_SOURCE {
                Err(QueryError::fault(0xC026_1B7A, "i2c timeout"))
            } else {
                Ok(reply(1, 1))
            }
        });

        let report = quick_prober().probe(&mock, &handle(), &vcp::DEFAULT_PROBE_CODES);
        assert_eq!(report.responsiveness, Responsiveness::CommunicationError);
        let failed = report.result(vcp::INPUT_SOURCE).unwrap();
        assert!(failed.is_fault());
        assert_eq!(failed.attempts, 3);
    }

    #[test]
    fn test_retry_then_success() {
        let mut mock = MockDisplayAccess::new();
        let mut seq = Sequence::new();
        mock.expect_query_feature()
            .with(eq(handle()), eq(vcp::BRIGHTNESS))
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(QueryError::fault(1, "nack")));
        mock.expect_query_feature()
            .with(eq(handle()), eq(vcp::BRIGHTNESS))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(reply(70, 100)));

        let report = quick_prober().probe(&mock, &handle(), &[vcp::BRIGHTNESS]);
        // Earlier faults do not count once the last attempt succeeds
        assert_eq!(report.responsiveness, Responsiveness::FullyResponsive);
        let result = report.result(vcp::BRIGHTNESS).unwrap();
        assert_eq!(result.attempts, 3);
        assert_eq!(result.error, None);
    }

    #[test]
    fn test_empty_code_list_is_unknown() {
        let mock = MockDisplayAccess::new();
        let report = quick_prober().probe(&mock, &handle(), &[]);
        assert_eq!(report.responsiveness, Responsiveness::Unknown);
        assert!(report.results.is_empty());
    }

    #[test]
    fn test_exhausted_budget_skips_codes() {
        let prober = CapabilityProber::new(ProbeSettings {
            retry_delay_ms: 0,
            budget_ms: Some(0),
            ..ProbeSettings::default()
        });
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature().times(0);

        let report = prober.probe(&mock, &handle(), &vcp::DEFAULT_PROBE_CODES);
        assert!(report.results.iter().all(ProbeResult::is_skipped));
        assert_eq!(report.responsiveness, Responsiveness::Unknown);
    }

    #[test]
    fn test_vendor_identity_from_probe() {
        let mut mock = MockDisplayAccess::new();
        mock.expect_query_feature().returning(|_, code| match code {
            vcp::DISPLAY_CONTROLLER_TYPE => Ok(reply(0x4D53, 0x5441)), // "TAMS"
            vcp::FIRMWARE_LEVEL => Ok(reply(0x0102, 0x0000)),
            _ => Err(QueryError::Unsupported),
        });

        let report = quick_prober().probe_default(&mock, &handle());
        assert_eq!(report.vendor.controller.as_ref().unwrap().text, "TAMS");
        assert_eq!(report.vendor.firmware.as_ref().unwrap().text, "1.2");
        assert_eq!(report.vendor.mccs_version, None);
        assert_eq!(report.responsiveness, Responsiveness::PartiallyResponsive);
    }

    #[test]
    fn test_classify_ignores_skipped() {
        let results = vec![
            ProbeResult::succeeded(0x10, reply(1, 2), 1),
            ProbeResult::skipped(0x12),
        ];
        assert_eq!(classify(&results), Responsiveness::FullyResponsive);
    }
}
