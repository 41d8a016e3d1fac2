use crate::{
    connection::Connection,
    error::ClientError,
};
use alloy::{
    contract::{
        ContractInstance,
        Interface,
    },
    dyn_abi::DynSolValue,
    json_abi::JsonAbi,
    primitives::{
        Address,
        TxHash,
        U256,
    },
    providers::DynProvider,
};
use std::{
    fmt,
    future::Future,
    str::FromStr,
};

const PER_SLOT_ABI: &str = include_str!("../abi/wrestling.json");
const OPPONENT_ABI: &str = include_str!("../abi/wrestling_opponent.json");

/// The deployed contract flavours the client knows how to talk to.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum ContractVariant {
    /// `registerWrestler1` / `registerWrestler2`, exposes deposits and gains.
    #[default]
    PerSlotRegistration,
    /// Single `registerAsAnOpponent`, no deposit or gains getters.
    OpponentRegistration,
}

impl ContractVariant {
    pub fn name(self) -> &'static str {
        match self {
            ContractVariant::PerSlotRegistration => "per-slot",
            ContractVariant::OpponentRegistration => "opponent",
        }
    }

    pub fn descriptor(self) -> &'static str {
        match self {
            ContractVariant::PerSlotRegistration => PER_SLOT_ABI,
            ContractVariant::OpponentRegistration => OPPONENT_ABI,
        }
    }

    pub fn interface(self) -> Result<JsonAbi, serde_json::Error> {
        serde_json::from_str(self.descriptor())
    }

    /// Read calls issued on load, in no meaningful order.
    pub fn tracked_fields(self) -> &'static [Field] {
        use Field::*;
        match self {
            ContractVariant::PerSlotRegistration => &[
                Wrestler1,
                Wrestler2,
                Wrestler1Played,
                Wrestler2Played,
                Wrestler1Deposit,
                Wrestler2Deposit,
                Winner,
                Gains,
                GameFinished,
            ],
            ContractVariant::OpponentRegistration => &[
                Wrestler1,
                Wrestler2,
                Wrestler1Played,
                Wrestler2Played,
                Winner,
                GameFinished,
            ],
        }
    }
}

impl fmt::Display for ContractVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-slot" => Ok(ContractVariant::PerSlotRegistration),
            "opponent" => Ok(ContractVariant::OpponentRegistration),
            other => Err(format!(
                "unknown contract variant '{other}' (expected per-slot or opponent)"
            )),
        }
    }
}

/// One of the two wrestler positions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Slot::One => 1,
            Slot::Two => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Address,
    Flag,
    Amount,
}

/// A polled read-only getter on the contract.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Field {
    Wrestler1,
    Wrestler2,
    Wrestler1Played,
    Wrestler2Played,
    Wrestler1Deposit,
    Wrestler2Deposit,
    Winner,
    Gains,
    GameFinished,
}

impl Field {
    pub fn method(self) -> &'static str {
        match self {
            Field::Wrestler1 => "wrestler1",
            Field::Wrestler2 => "wrestler2",
            Field::Wrestler1Played => "wrestler1Played",
            Field::Wrestler2Played => "wrestler2Played",
            Field::Wrestler1Deposit => "wrestler1Deposit",
            Field::Wrestler2Deposit => "wrestler2Deposit",
            Field::Winner => "theWinner",
            Field::Gains => "gains",
            Field::GameFinished => "gameFinished",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Wrestler1 | Field::Wrestler2 | Field::Winner => FieldKind::Address,
            Field::Wrestler1Played | Field::Wrestler2Played | Field::GameFinished => {
                FieldKind::Flag
            }
            Field::Wrestler1Deposit | Field::Wrestler2Deposit | Field::Gains => {
                FieldKind::Amount
            }
        }
    }

    pub fn player(slot: Slot) -> Field {
        match slot {
            Slot::One => Field::Wrestler1,
            Slot::Two => Field::Wrestler2,
        }
    }

    pub fn played(slot: Slot) -> Field {
        match slot {
            Slot::One => Field::Wrestler1Played,
            Slot::Two => Field::Wrestler2Played,
        }
    }

    pub fn deposit(slot: Slot) -> Field {
        match slot {
            Slot::One => Field::Wrestler1Deposit,
            Slot::Two => Field::Wrestler2Deposit,
        }
    }

    /// Turns raw call output into the value this getter promises.
    pub fn decode(self, outputs: &[DynSolValue]) -> Result<FieldValue, ClientError> {
        let mismatch = |reason: String| ClientError::Decode {
            method: self.method().to_string(),
            reason,
        };
        let [value] = outputs else {
            return Err(mismatch(format!("expected 1 output, got {}", outputs.len())));
        };
        match (self.kind(), value) {
            (FieldKind::Address, DynSolValue::Address(a)) => Ok(FieldValue::Address(*a)),
            (FieldKind::Flag, DynSolValue::Bool(b)) => Ok(FieldValue::Flag(*b)),
            (FieldKind::Amount, DynSolValue::Uint(n, _)) => Ok(FieldValue::Amount(*n)),
            (kind, other) => Err(mismatch(format!("expected {kind:?}, got {other:?}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Address(Address),
    Flag(bool),
    Amount(U256),
}

impl FieldValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            FieldValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_amount(&self) -> Option<U256> {
        match self {
            FieldValue::Amount(n) => Some(*n),
            _ => None,
        }
    }
}

/// A state-changing contract function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteCall {
    RegisterWrestler1,
    RegisterWrestler2,
    RegisterAsAnOpponent,
    Wrestle,
    Withdraw,
}

impl WriteCall {
    pub fn method(self) -> &'static str {
        match self {
            WriteCall::RegisterWrestler1 => "registerWrestler1",
            WriteCall::RegisterWrestler2 => "registerWrestler2",
            WriteCall::RegisterAsAnOpponent => "registerAsAnOpponent",
            WriteCall::Wrestle => "wrestle",
            WriteCall::Withdraw => "withdraw",
        }
    }
}

/// Transaction fields attached to a write call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TxOptions {
    pub from: Option<Address>,
    pub gas_price: u128,
    pub value: U256,
}

/// The seam between the session logic and whatever executes contract calls.
pub trait ContractBackend {
    fn read(&self, field: Field) -> impl Future<Output = Result<FieldValue, ClientError>>;

    fn send(
        &self,
        call: WriteCall,
        options: TxOptions,
    ) -> impl Future<Output = Result<TxHash, ClientError>>;

    fn can_sign(&self) -> bool;
}

/// The bound contract: fixed address, interface descriptor and provider.
pub struct ContractView {
    instance: ContractInstance<DynProvider>,
    default_sender: Option<Address>,
    can_sign: bool,
}

impl ContractView {
    pub fn bind(
        address: Address,
        variant: ContractVariant,
        connection: &Connection,
    ) -> Result<Self, ClientError> {
        let abi = variant.interface().map_err(|e| ClientError::Decode {
            method: format!("{variant} interface descriptor"),
            reason: e.to_string(),
        })?;
        let instance =
            ContractInstance::new(address, connection.provider().clone(), Interface::new(abi));
        Ok(Self {
            instance,
            default_sender: None,
            can_sign: connection.can_sign(),
        })
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }

    pub fn set_default_sender(&mut self, account: Address) {
        self.default_sender = Some(account);
    }
}

impl ContractBackend for ContractView {
    async fn read(&self, field: Field) -> Result<FieldValue, ClientError> {
        let method = field.method();
        let outputs = self
            .instance
            .function(method, &[])
            .map_err(|e| ClientError::from_contract(method, e))?
            .call()
            .await
            .map_err(|e| ClientError::from_contract(method, e))?;
        field.decode(&outputs)
    }

    async fn send(&self, call: WriteCall, options: TxOptions) -> Result<TxHash, ClientError> {
        if !self.can_sign {
            return Err(ClientError::NoSigner);
        }
        let method = call.method();
        let mut builder = self
            .instance
            .function(method, &[])
            .map_err(|e| ClientError::from_contract(method, e))?
            .gas_price(options.gas_price)
            .value(options.value);
        if let Some(from) = options.from.or(self.default_sender) {
            builder = builder.from(from);
        }
        let pending = builder
            .send()
            .await
            .map_err(|e| ClientError::from_contract(method, e))?;
        Ok(*pending.tx_hash())
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use alloy::{
        primitives::Bytes,
        providers::{
            Provider,
            ProviderBuilder,
        },
        transports::mock::Asserter,
    };

    fn mocked_view(variant: ContractVariant) -> (Asserter, ContractView) {
        let asserter = Asserter::new();
        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        let connection = Connection::ReadOnly { provider };
        let view = ContractView::bind(Address::repeat_byte(0x42), variant, &connection).unwrap();
        (asserter, view)
    }

    #[tokio::test]
    async fn view__read_only_send_is_refused_before_any_request() {
        // given
        let (asserter, view) = mocked_view(ContractVariant::PerSlotRegistration);
        asserter.push_success(&TxHash::with_last_byte(1));

        // when
        let err = view
            .send(
                WriteCall::Wrestle,
                TxOptions {
                    from: None,
                    gas_price: 1,
                    value: U256::from(1u64),
                },
            )
            .await
            .unwrap_err();

        // then
        assert!(matches!(err, ClientError::NoSigner));
        assert_eq!(asserter.read_q().len(), 1);
    }

    #[tokio::test]
    async fn view__read_decodes_call_output() {
        // given
        let (asserter, view) = mocked_view(ContractVariant::PerSlotRegistration);
        asserter.push_success(&Bytes::from(DynSolValue::Bool(true).abi_encode()));

        // when
        let value = view.read(Field::GameFinished).await.unwrap();

        // then
        assert_eq!(value, FieldValue::Flag(true));
    }

    #[tokio::test]
    async fn view__truncated_return_data_is_decode_error() {
        // given
        let (asserter, view) = mocked_view(ContractVariant::PerSlotRegistration);
        asserter.push_success(&Bytes::from(vec![0x01]));

        // when
        let err = view.read(Field::Wrestler1).await.unwrap_err();

        // then
        assert!(matches!(err, ClientError::Decode { method, .. } if method == "wrestler1"));
    }

    #[tokio::test]
    async fn view__empty_return_data_is_decode_error() {
        // given
        let (asserter, view) = mocked_view(ContractVariant::PerSlotRegistration);
        asserter.push_success(&Bytes::new());

        // when
        let err = view.read(Field::Winner).await.unwrap_err();

        // then
        assert!(matches!(err, ClientError::Decode { method, .. } if method == "theWinner"));
    }

    #[tokio::test]
    async fn view__rpc_failure_is_rpc_error() {
        let (asserter, view) = mocked_view(ContractVariant::PerSlotRegistration);
        asserter.push_failure_msg("header not found");

        let err = view.read(Field::Winner).await.unwrap_err();

        assert!(matches!(err, ClientError::Rpc(_)));
    }

    #[tokio::test]
    async fn view__field_missing_from_variant_is_interface_error() {
        // given
        let (asserter, view) = mocked_view(ContractVariant::OpponentRegistration);

        // when
        let err = view.read(Field::Gains).await.unwrap_err();

        // then
        assert!(matches!(err, ClientError::Interface { method } if method == "gains"));
        assert!(asserter.read_q().is_empty());
    }

    #[test]
    fn interface__every_tracked_field_is_a_view_function_of_its_variant() {
        for variant in [
            ContractVariant::PerSlotRegistration,
            ContractVariant::OpponentRegistration,
        ] {
            // given
            let abi = variant.interface().unwrap();

            // then
            for field in variant.tracked_fields() {
                let functions = abi
                    .function(field.method())
                    .unwrap_or_else(|| panic!("{variant}: missing {}", field.method()));
                assert_eq!(functions[0].outputs.len(), 1);
            }
        }
    }

    #[test]
    fn interface__variants_differ_in_registration_method() {
        // given
        let per_slot = ContractVariant::PerSlotRegistration.interface().unwrap();
        let opponent = ContractVariant::OpponentRegistration.interface().unwrap();

        // then
        assert!(per_slot.function("registerWrestler1").is_some());
        assert!(per_slot.function("registerAsAnOpponent").is_none());
        assert!(opponent.function("registerAsAnOpponent").is_some());
        assert!(opponent.function("gains").is_none());
        assert!(opponent.function("wrestler1Deposit").is_none());
    }

    #[test]
    fn decode__maps_output_to_field_kind() {
        let addr = Address::repeat_byte(0x11);

        assert_eq!(
            Field::Wrestler1.decode(&[DynSolValue::Address(addr)]).unwrap(),
            FieldValue::Address(addr)
        );
        assert_eq!(
            Field::GameFinished.decode(&[DynSolValue::Bool(true)]).unwrap(),
            FieldValue::Flag(true)
        );
        assert_eq!(
            Field::Gains
                .decode(&[DynSolValue::Uint(U256::from(7u64), 256)])
                .unwrap(),
            FieldValue::Amount(U256::from(7u64))
        );
    }

    #[test]
    fn decode__rejects_mismatched_output() {
        // when
        let err = Field::Wrestler1Played
            .decode(&[DynSolValue::Uint(U256::from(1u64), 256)])
            .unwrap_err();

        // then
        assert!(matches!(err, ClientError::Decode { method, .. } if method == "wrestler1Played"));
    }

    #[test]
    fn decode__rejects_wrong_output_count() {
        let err = Field::Winner.decode(&[]).unwrap_err();
        assert!(matches!(err, ClientError::Decode { .. }));
    }

    #[test]
    fn variant__parses_cli_names() {
        assert_eq!(
            "opponent".parse::<ContractVariant>().unwrap(),
            ContractVariant::OpponentRegistration
        );
        assert_eq!(
            "per-slot".parse::<ContractVariant>().unwrap(),
            ContractVariant::PerSlotRegistration
        );
        assert!("ledger".parse::<ContractVariant>().is_err());
    }
}
