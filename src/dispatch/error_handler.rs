use anyhow::Result;
use log::debug;

use super::worker::FailureSlot;

/// Check failure slots after every worker was joined: return the first recorded error in
/// worker-start order (not necessarily the earliest in time). Later errors are only logged.
pub fn check_for_first_failure(slots: Vec<FailureSlot>) -> Result<()> {
    let mut first = None;
    for (id, slot) in slots.into_iter().enumerate() {
        match (slot, first.is_some()) {
            (Some(err), false) => first = Some(err),
            (Some(err), true) => debug!("worker {id}: additional failure suppressed: {err:#}"),
            (None, _) => {}
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_failures() {
        assert!(check_for_first_failure(vec![None, None, None]).is_ok());
        assert!(check_for_first_failure(Vec::new()).is_ok());
    }

    #[test]
    fn test_first_in_start_order_wins() {
        let slots = vec![
            None,
            Some(anyhow::anyhow!("second worker")),
            Some(anyhow::anyhow!("third worker")),
        ];
        let err = check_for_first_failure(slots).unwrap_err();
        assert_eq!(err.to_string(), "second worker");
    }
}
