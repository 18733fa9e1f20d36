//! Shared domain types for the settlement ledger: account keys, assets,
//! matched orders, the settlement operation envelope, and its per-order
//! result codes.
//!
//! Everything here is a plain serde-serializable value type; behaviour
//! lives in the ledger and settlement crates.

use serde::{Deserialize, Serialize};

/// Length of an encoded account key string.
pub const KEY_LEN: usize = 56;

/// Leading character of an encoded node (account) key.
pub const NODE_KEY_LEAD: char = 'Q';

/// Leading character of an encoded transaction-signer key. Well-formed as
/// an encoding, but never a valid account or node id.
pub const SIGNER_KEY_LEAD: char = 'T';

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// An account identifier: a 256-bit public key carried in its 56-character
/// upper-case base-32 string encoding, with a leading type character.
///
/// Construction is unchecked; callers that admit external input validate
/// with [`AccountId::is_well_formed`]. Lower-case encodings are always
/// rejected.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(key: impl Into<String>) -> Self {
        AccountId(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` if this is a syntactically valid node-type account key:
    /// exactly [`KEY_LEN`] characters from the upper-case base-32 alphabet
    /// (`A`–`Z`, `2`–`7`), leading with [`NODE_KEY_LEAD`].
    pub fn is_well_formed(&self) -> bool {
        let bytes = self.0.as_bytes();
        bytes.len() == KEY_LEN
            && bytes[0] == NODE_KEY_LEAD as u8
            && bytes.iter().all(|&b| is_base32_byte(b))
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_base32_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A unit of value on the ledger: the native asset, or one issued by an
/// account under a short (up to 4 characters) or long (5 to 12 characters)
/// alphanumeric code.
///
/// Two assets are equal iff same variant and same payload.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Asset {
    Native,
    Issued(IssuedAsset),
}

/// Issuer/code pair of a non-native asset.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IssuedAsset {
    pub code: String,
    pub issuer: AccountId,
}

impl Asset {
    pub fn native() -> Self {
        Asset::Native
    }

    pub fn issued(code: impl Into<String>, issuer: AccountId) -> Self {
        Asset::Issued(IssuedAsset {
            code: code.into(),
            issuer,
        })
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Asset::Native)
    }

    /// Structural validity: native is always well formed; an issued asset
    /// needs a 1–12 character ASCII-alphanumeric code and a well-formed
    /// issuer key.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Asset::Native => true,
            Asset::Issued(issued) => {
                let code = issued.code.as_bytes();
                !code.is_empty()
                    && code.len() <= 12
                    && code.iter().all(|b| b.is_ascii_alphanumeric())
                    && issued.issuer.is_well_formed()
            }
        }
    }

    /// Issuer of a non-native asset.
    pub fn issuer(&self) -> Option<&AccountId> {
        match self {
            Asset::Native => None,
            Asset::Issued(issued) => Some(&issued.issuer),
        }
    }
}

// ---------------------------------------------------------------------------
// Settlement operation
// ---------------------------------------------------------------------------

/// One pre-matched order: the buyer gains `amount_buy` of `asset_buy` and
/// loses `amount_sell` of `asset_sell`; the seller moves mirror-wise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedOrder {
    pub buyer: AccountId,
    pub seller: AccountId,
    pub amount_buy: i64,
    pub amount_sell: i64,
    pub asset_buy: Asset,
    pub asset_sell: Asset,
}

/// The settlement operation: an ordered batch of matched orders with a
/// designated source account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOp {
    pub source: AccountId,
    pub matched_orders: Vec<MatchedOrder>,
}

// ---------------------------------------------------------------------------
// Result codes
// ---------------------------------------------------------------------------

/// Per-matched-order outcome. One code per order, written at the order's
/// index in the operation result vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementResultCode {
    Success,

    // Operation-level, occupies index 0 when the source account is wrong.
    SourceAccountInvalid,

    // Structural pre-checks.
    InvalidAsset,
    AssetsIdentical,
    NegativeAmount,
    CrossSelf,

    // Identity.
    BuyerAccountInvalid,
    SellerAccountInvalid,

    // Trustline resolution, sell side checked before buy side.
    SellNoIssuer,
    SellNoTrust,
    SellNotAuthorized,
    BuyNoIssuer,
    BuyNoTrust,
    BuyNotAuthorized,

    // Capacity.
    LineFull,
    SellerLineFull,
    BuyOverLimit,
    SellOverBalance,

    // Reserved for a ledger-version gate; not produced today.
    NotSupportedYet,
}

impl SettlementResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, SettlementResultCode::Success)
    }

    /// Cause segment of the `op-settlement.invalid.<cause>` counter marked
    /// on this failure path. `None` for success.
    pub fn metric_cause(self) -> Option<&'static str> {
        use SettlementResultCode::*;
        Some(match self {
            Success => return None,
            SourceAccountInvalid => "source-account",
            InvalidAsset => "malformed-asset",
            AssetsIdentical => "assets-identical",
            NegativeAmount => "negative-amount",
            CrossSelf => "cross-self",
            BuyerAccountInvalid => "no-buyer-account",
            SellerAccountInvalid => "no-seller-account",
            SellNoIssuer => "sell-no-issuer",
            SellNoTrust => "sell-no-trust",
            SellNotAuthorized => "sell-not-authorized",
            BuyNoIssuer => "buy-no-issuer",
            BuyNoTrust => "buy-no-trust",
            BuyNotAuthorized => "buy-not-authorized",
            LineFull => "line-full",
            SellerLineFull => "seller-line-full",
            BuyOverLimit => "buy-over-limit",
            SellOverBalance => "sell-over-balance",
            NotSupportedYet => "not-supported-yet",
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
