//! Replenishment order drafts handed to the procurement workflow.

use crate::{
    alert_monitor::{Alert, Urgency},
    types::{AccountId, Denomination},
    wallet::WalletAccount,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplenishmentOrder {
    pub order_id:     String,
    pub account_id:   AccountId,
    pub client:       String,
    pub state:        String,
    pub article_code: String,
    pub denomination: Denomination,
    pub quantity:     u64,
    /// quantity × denomination, in currency units.
    pub face_value:   u64,
    pub urgency:      Urgency,
}

/// Draft an order for an actionable alert that needs stock.
pub fn draft_order(
    account: &WalletAccount,
    alert: &Alert,
    as_of: NaiveDate,
) -> Option<ReplenishmentOrder> {
    if !alert.is_actionable() || alert.required_qty == 0 {
        return None;
    }
    let denomination = account.denomination();
    Some(ReplenishmentOrder {
        order_id:     format!("ord-{}-{}", account.account_id, as_of.format("%Y%m%d")),
        account_id:   account.account_id.clone(),
        client:       account.key.client.clone(),
        state:        account.key.state.clone(),
        article_code: account.key.article_code.clone(),
        denomination,
        quantity:     alert.required_qty,
        face_value:   alert.required_qty.saturating_mul(denomination),
        urgency:      alert.urgency,
    })
}
