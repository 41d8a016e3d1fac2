use crate::contract::{
    Field,
    FieldValue,
    Slot,
};
use alloy::primitives::{
    Address,
    U256,
};
use std::collections::BTreeMap;

/// Last observed value of every polled field, plus the active account.
///
/// Fields resolve independently; a missing entry means "unresolved".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    account: Option<Address>,
    fields: BTreeMap<Field, FieldValue>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn set_account(&mut self, account: Address) {
        self.account = Some(account);
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field)
    }

    pub fn is_resolved(&self, field: Field) -> bool {
        self.fields.contains_key(&field)
    }

    pub fn resolved_count(&self) -> usize {
        self.fields.len()
    }

    pub fn store(&mut self, field: Field, value: FieldValue) {
        self.fields.insert(field, value);
    }

    pub fn player(&self, slot: Slot) -> Option<Address> {
        self.get(Field::player(slot)).and_then(FieldValue::as_address)
    }

    /// `None` while the flag is unresolved.
    pub fn played(&self, slot: Slot) -> Option<bool> {
        self.get(Field::played(slot)).and_then(FieldValue::as_flag)
    }

    pub fn deposit(&self, slot: Slot) -> Option<U256> {
        self.get(Field::deposit(slot)).and_then(FieldValue::as_amount)
    }

    pub fn gains(&self) -> Option<U256> {
        self.get(Field::Gains).and_then(FieldValue::as_amount)
    }

    pub fn game_finished(&self) -> Option<bool> {
        self.get(Field::GameFinished).and_then(FieldValue::as_flag)
    }

    /// The slot the active account plays in for deposits.
    ///
    /// Only an exact match with a resolved wrestler 1 selects slot one;
    /// everyone else, spectators included, is treated as wrestler 2.
    pub fn deposit_role(&self) -> Slot {
        match (self.account, self.player(Slot::One)) {
            (Some(account), Some(first)) if account == first => Slot::One,
            _ => Slot::Two,
        }
    }

    /// True when the account is known and matches neither resolved wrestler.
    pub fn is_spectator(&self) -> bool {
        let Some(account) = self.account else {
            return false;
        };
        [Slot::One, Slot::Two]
            .into_iter()
            .all(|slot| self.player(slot) != Some(account))
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn deposit_role__matching_wrestler1_selects_slot_one() {
        // given
        let me = Address::repeat_byte(0xaa);
        let mut session = SessionState::new();
        session.set_account(me);
        session.store(Field::Wrestler1, FieldValue::Address(me));

        // then
        assert_eq!(session.deposit_role(), Slot::One);
        assert!(!session.is_spectator());
    }

    #[test]
    fn deposit_role__unresolved_wrestler1_defaults_to_slot_two() {
        let mut session = SessionState::new();
        session.set_account(Address::repeat_byte(0xaa));

        assert_eq!(session.deposit_role(), Slot::Two);
    }

    #[test]
    fn deposit_role__no_account_defaults_to_slot_two() {
        let mut session = SessionState::new();
        session.store(Field::Wrestler1, FieldValue::Address(Address::ZERO));

        assert_eq!(session.deposit_role(), Slot::Two);
        assert!(!session.is_spectator());
    }

    #[test]
    fn is_spectator__account_matching_no_wrestler() {
        // given
        let mut session = SessionState::new();
        session.set_account(Address::repeat_byte(0xcc));
        session.store(Field::Wrestler1, FieldValue::Address(Address::repeat_byte(0xaa)));
        session.store(Field::Wrestler2, FieldValue::Address(Address::repeat_byte(0xbb)));

        // then
        assert!(session.is_spectator());
        assert_eq!(session.deposit_role(), Slot::Two);
    }

    #[test]
    fn getters__ignore_values_of_the_wrong_kind() {
        let mut session = SessionState::new();
        session.store(Field::Wrestler1Played, FieldValue::Amount(U256::from(1u64)));

        assert!(session.is_resolved(Field::Wrestler1Played));
        assert_eq!(session.played(Slot::One), None);
    }
}
