use crate::{
    contract::{
        ContractBackend,
        ContractVariant,
        Slot,
        TxOptions,
        WriteCall,
    },
    error::ClientError,
    session::SessionState,
};
use alloy::primitives::{
    TxHash,
    U256,
    utils::{
        ParseUnits,
        parse_units,
    },
};
use std::fmt;
use tracing::{
    error,
    info,
    warn,
};

/// 4.1 gwei.
pub const DEFAULT_GAS_PRICE_WEI: u128 = 4_100_000_000;

/// The fixed fee-per-gas attached to every write call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GasPricePolicy {
    wei: u128,
}

impl Default for GasPricePolicy {
    fn default() -> Self {
        Self {
            wei: DEFAULT_GAS_PRICE_WEI,
        }
    }
}

impl GasPricePolicy {
    pub fn from_wei(wei: u128) -> Self {
        Self { wei }
    }

    pub fn from_gwei(gwei: &str) -> Result<Self, ClientError> {
        let invalid = |reason: String| ClientError::InvalidGasPrice {
            input: gwei.to_string(),
            reason,
        };
        let wei = parse_unsigned(gwei, "gwei").map_err(invalid)?;
        let wei = u128::try_from(wei).map_err(|e| invalid(e.to_string()))?;
        Ok(Self { wei })
    }

    pub fn wei(&self) -> u128 {
        self.wei
    }
}

/// Decimal string to base units. Negative input is rejected rather than wrapped.
fn parse_unsigned(raw: &str, unit: &str) -> Result<U256, String> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err("amount must not be negative".to_string());
    }
    match parse_units(raw, unit).map_err(|e| e.to_string())? {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(_) => Err("amount must not be negative".to_string()),
    }
}

/// A user-initiated page action.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Register(Slot),
    Wrestle,
    Withdraw,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Register(slot) => write!(f, "register as wrestler {}", slot.number()),
            Action::Wrestle => f.write_str("wrestle"),
            Action::Withdraw => f.write_str("withdraw"),
        }
    }
}

/// The two free-text stake fields, read only when a wrestle is dispatched.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DepositInputs {
    pub first: String,
    pub second: String,
}

impl DepositInputs {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::One => &self.first,
            Slot::Two => &self.second,
        }
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::One => &mut self.first,
            Slot::Two => &mut self.second,
        }
    }
}

/// A fully resolved write call, ready to submit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WriteRequest {
    pub action: Action,
    pub call: WriteCall,
    pub options: TxOptions,
}

/// Maps page actions to exactly one write call each.
#[derive(Clone, Copy, Debug)]
pub struct ActionDispatcher {
    variant: ContractVariant,
    gas_price: GasPricePolicy,
}

impl ActionDispatcher {
    pub fn new(variant: ContractVariant, gas_price: GasPricePolicy) -> Self {
        Self { variant, gas_price }
    }

    pub fn gas_price(&self) -> GasPricePolicy {
        self.gas_price
    }

    fn call_for(&self, action: Action) -> WriteCall {
        match (action, self.variant) {
            (Action::Register(_), ContractVariant::OpponentRegistration) => {
                WriteCall::RegisterAsAnOpponent
            }
            (Action::Register(Slot::One), ContractVariant::PerSlotRegistration) => {
                WriteCall::RegisterWrestler1
            }
            (Action::Register(Slot::Two), ContractVariant::PerSlotRegistration) => {
                WriteCall::RegisterWrestler2
            }
            (Action::Wrestle, _) => WriteCall::Wrestle,
            (Action::Withdraw, _) => WriteCall::Withdraw,
        }
    }

    /// Resolves the call, sender, gas price and value for `action` against the current session.
    pub fn plan(
        &self,
        action: Action,
        session: &SessionState,
        inputs: &DepositInputs,
    ) -> Result<WriteRequest, ClientError> {
        let value = match action {
            Action::Wrestle => {
                if session.is_spectator() {
                    warn!(
                        account = ?session.account(),
                        "account is not a registered wrestler; the contract decides whether it may wrestle"
                    );
                }
                let raw = inputs.get(session.deposit_role());
                parse_unsigned(raw, "ether").map_err(|reason| ClientError::InvalidAmount {
                    input: raw.to_string(),
                    reason,
                })?
            }
            Action::Register(_) | Action::Withdraw => U256::ZERO,
        };
        Ok(WriteRequest {
            action,
            call: self.call_for(action),
            options: TxOptions {
                from: session.account(),
                gas_price: self.gas_price.wei(),
                value,
            },
        })
    }

    /// Sends a planned request and logs the outcome. No retry, no session change.
    pub async fn submit<B: ContractBackend>(
        &self,
        backend: &B,
        request: WriteRequest,
    ) -> Result<TxHash, ClientError> {
        let result = if backend.can_sign() {
            backend.send(request.call, request.options).await
        } else {
            Err(ClientError::NoSigner)
        };
        match &result {
            Ok(hash) => info!(action = %request.action, method = request.call.method(), "Tx Hash: {hash}"),
            Err(err) => error!(action = %request.action, method = request.call.method(), error = %err, "write call failed"),
        }
        result
    }

    /// [`plan`](Self::plan), logging a failure instead of leaving it to the caller.
    pub fn prepare(
        &self,
        action: Action,
        session: &SessionState,
        inputs: &DepositInputs,
    ) -> Result<WriteRequest, ClientError> {
        self.plan(action, session, inputs).inspect_err(|err| {
            error!(action = %action, error = %err, "could not prepare write call");
        })
    }

    /// Plans and submits in one step.
    pub async fn dispatch<B: ContractBackend>(
        &self,
        backend: &B,
        action: Action,
        session: &SessionState,
        inputs: &DepositInputs,
    ) -> Result<TxHash, ClientError> {
        let request = self.prepare(action, session, inputs)?;
        self.submit(backend, request).await
    }
}
