//! Shared checks used by collectors that decode `ipmi-raw` responses.
//!
//! An `ipmi-raw` response starts with the echoed command byte followed by
//! the IPMI completion code; the response data comes after.

use crate::collector::CollectorName;
use crate::decode::Octets;
use crate::error::{CollectError, ExpectedLen};
use crate::target::Target;

/// Position of the completion code in an `ipmi-raw` response.
pub const COMPLETION_CODE: usize = 1;

/// Completion code of a successful command.
pub const COMPLETION_OK: &str = "00";

/// Program every built-in collector runs.
pub const IPMI_RAW: &str = "ipmi-raw";

/// Fail with a shape error unless the response has the expected length.
pub fn expect_len(
    collector: CollectorName,
    octets: &Octets,
    expected: ExpectedLen,
    target: &Target,
) -> Result<(), CollectError> {
    if expected.matches(octets.len()) {
        return Ok(());
    }
    log::error!("{collector}: unexpected number of octets from {target}: {octets}");
    Err(CollectError::Shape {
        target: target.name().to_string(),
        expected,
        actual: octets.len(),
    })
}

/// Fail with a classification error unless the completion code is `00`.
///
/// Call after [`expect_len`] has guaranteed the code is present.
pub fn expect_completion_ok(
    collector: CollectorName,
    octets: &Octets,
    target: &Target,
) -> Result<(), CollectError> {
    match octets.get(COMPLETION_CODE) {
        Some(COMPLETION_OK) => Ok(()),
        other => {
            let value = other.unwrap_or_default().to_string();
            log::error!("{collector}: completion code {value} from {target}");
            Err(CollectError::Classification {
                target: target.name().to_string(),
                field: "completion code",
                value,
            })
        }
    }
}

/// Numeric value of an already-validated octet.
pub fn octet_value(octets: &Octets, index: usize) -> f64 {
    octets.byte(index).map(f64::from).unwrap_or_default()
}

/// Classification failure for `field`, logged with the offending token.
pub fn unexpected(
    collector: CollectorName,
    field: &'static str,
    value: &str,
    target: &Target,
) -> CollectError {
    log::error!("{collector}: unexpected {field} from {target}: {value}");
    CollectError::Classification {
        target: target.name().to_string(),
        field,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{RawResult, decode_raw_octets};
    use crate::error::ErrorKind;

    const NAME: CollectorName = CollectorName::new("test");

    fn octets(s: &str) -> Octets {
        decode_raw_octets(&RawResult::from(s)).unwrap()
    }

    #[test]
    fn expect_len_reports_actual() {
        let err = expect_len(NAME, &octets("01 00"), ExpectedLen::Exactly(3), &Target::local())
            .unwrap_err();
        assert_eq!(
            err,
            CollectError::Shape {
                target: "[local]".into(),
                expected: ExpectedLen::Exactly(3),
                actual: 2,
            }
        );
    }

    #[test]
    fn completion_code_must_be_zero() {
        let target = Target::remote("bmc");
        assert!(expect_completion_ok(NAME, &octets("01 00 11"), &target).is_ok());
        let err = expect_completion_ok(NAME, &octets("01 C1"), &target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Classification);
        assert!(err.to_string().contains("C1"));
    }

    #[test]
    fn octet_value_is_hex() {
        assert_eq!(octet_value(&octets("0A 10"), 1), 16.0);
    }
}
