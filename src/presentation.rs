//! Rendering hooks and the rules that turn resolved fields into page updates.

use crate::{
    contract::{
        Field,
        FieldValue,
        Slot,
    },
    session::SessionState,
};
use alloy::primitives::{
    Address,
    U256,
    utils::format_ether,
};

pub const WAITING_FOR_PLAYER: &str = "Waiting for a player...";

/// Named text insertion points on the page.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum TextSlot {
    Account,
    Mode,
    Wrestler1,
    Wrestler2,
    Wrestler1Deposit,
    Wrestler2Deposit,
    Winner,
    Gains,
}

impl TextSlot {
    pub fn player(slot: Slot) -> TextSlot {
        match slot {
            Slot::One => TextSlot::Wrestler1,
            Slot::Two => TextSlot::Wrestler2,
        }
    }

    pub fn deposit(slot: Slot) -> TextSlot {
        match slot {
            Slot::One => TextSlot::Wrestler1Deposit,
            Slot::Two => TextSlot::Wrestler2Deposit,
        }
    }
}

/// Buttons whose visibility the session drives.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Control {
    Register1,
    Register2,
    Wrestle1,
    Wrestle2,
    Withdraw1,
    Withdraw2,
}

impl Control {
    pub const ALL: [Control; 6] = [
        Control::Register1,
        Control::Register2,
        Control::Wrestle1,
        Control::Wrestle2,
        Control::Withdraw1,
        Control::Withdraw2,
    ];

    pub fn register(slot: Slot) -> Control {
        match slot {
            Slot::One => Control::Register1,
            Slot::Two => Control::Register2,
        }
    }

    pub fn wrestle(slot: Slot) -> Control {
        match slot {
            Slot::One => Control::Wrestle1,
            Slot::Two => Control::Wrestle2,
        }
    }

    pub fn withdraw(slot: Slot) -> Control {
        match slot {
            Slot::One => Control::Withdraw1,
            Slot::Two => Control::Withdraw2,
        }
    }
}

/// One batch of page changes. Field resolutions carry their `source`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PresentationUpdate {
    pub source: Option<Field>,
    pub texts: Vec<(TextSlot, String)>,
    pub visibility: Vec<(Control, bool)>,
}

impl PresentationUpdate {
    fn for_field(field: Field) -> Self {
        Self {
            source: Some(field),
            ..Self::default()
        }
    }

    fn text(mut self, slot: TextSlot, text: impl Into<String>) -> Self {
        self.texts.push((slot, text.into()));
        self
    }

    fn visible(mut self, control: Control, visible: bool) -> Self {
        self.visibility.push((control, visible));
        self
    }

    pub fn mode(label: &str) -> Self {
        Self::default().text(TextSlot::Mode, label)
    }

    pub fn account(account: Address) -> Self {
        Self::default().text(TextSlot::Account, account.to_string())
    }
}

/// The host environment's rendering primitives.
pub trait Presenter {
    fn render(&mut self, update: &PresentationUpdate);
}

/// Wrestle control visibility from the two played flags; unresolved counts as not played.
///
/// Derived from both flags together so the outcome does not depend on which read lands
/// last. With both flags set the round is waiting on the contract to settle it, so neither
/// side may wrestle and both controls are hidden.
pub fn wrestle_visibility(first: Option<bool>, second: Option<bool>) -> (bool, bool) {
    match (first.unwrap_or(false), second.unwrap_or(false)) {
        (false, false) => (true, true),
        (true, false) => (false, true),
        (false, true) => (true, false),
        // round awaiting settlement
        (true, true) => (false, false),
    }
}

/// The page update for `field` having resolved to `value`.
///
/// Played flags read their sibling from `session`, which must already hold `value`.
pub fn project(field: Field, value: &FieldValue, session: &SessionState) -> PresentationUpdate {
    let update = PresentationUpdate::for_field(field);
    match (field, value) {
        (Field::Wrestler1, FieldValue::Address(player)) => player_slot(update, Slot::One, *player),
        (Field::Wrestler2, FieldValue::Address(player)) => player_slot(update, Slot::Two, *player),
        (Field::Wrestler1Played | Field::Wrestler2Played, FieldValue::Flag(_)) => {
            let (first, second) =
                wrestle_visibility(session.played(Slot::One), session.played(Slot::Two));
            update
                .visible(Control::Wrestle1, first)
                .visible(Control::Wrestle2, second)
        }
        (Field::Wrestler1Deposit, FieldValue::Amount(amount)) => {
            update.text(TextSlot::Wrestler1Deposit, format_amount(*amount))
        }
        (Field::Wrestler2Deposit, FieldValue::Amount(amount)) => {
            update.text(TextSlot::Wrestler2Deposit, format_amount(*amount))
        }
        (Field::Winner, FieldValue::Address(winner)) => {
            update.text(TextSlot::Winner, winner.to_string())
        }
        (Field::Gains, FieldValue::Amount(amount)) => {
            update.text(TextSlot::Gains, format_amount(*amount))
        }
        (Field::GameFinished, FieldValue::Flag(finished)) => update
            .visible(Control::Withdraw1, *finished)
            .visible(Control::Withdraw2, *finished),
        // decode guarantees the kind; nothing to draw otherwise
        _ => update,
    }
}

fn player_slot(update: PresentationUpdate, slot: Slot, player: Address) -> PresentationUpdate {
    let vacant = player.is_zero();
    let text = if vacant {
        WAITING_FOR_PLAYER.to_string()
    } else {
        player.to_string()
    };
    update
        .text(TextSlot::player(slot), text)
        .visible(Control::register(slot), vacant)
}

/// Wei rendered in ether with trailing zeros trimmed, e.g. `0.5 ETH`.
pub fn format_amount(wei: U256) -> String {
    let ether = format_ether(wei);
    let trimmed = if ether.contains('.') {
        ether.trim_end_matches('0').trim_end_matches('.')
    } else {
        ether.as_str()
    };
    format!("{trimmed} ETH")
}
