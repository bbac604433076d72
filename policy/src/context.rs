use crate::error::PolicyError;
use fixinsured_types::{Address, Amount, Timestamp};

/// Who is calling, what they attached, and when.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
    pub now: Timestamp,
}

impl CallContext {
    /// A call with no attached value.
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self {
            caller,
            value: Amount::ZERO,
            now,
        }
    }

    /// A call attaching `value`.
    pub fn paying(caller: Address, value: Amount, now: Timestamp) -> Self {
        Self { caller, value, now }
    }

    /// Fail with `Payment` if value was attached to a non-payable operation.
    pub fn require_no_value(&self) -> Result<(), PolicyError> {
        if self.value.is_zero() {
            Ok(())
        } else {
            Err(PolicyError::Payment(format!(
                "operation is not payable, {} attached",
                self.value
            )))
        }
    }
}
