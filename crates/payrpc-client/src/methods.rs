//! Well-known method names.

/// Outbound API operations.
pub const ACCOUNT_LEDGER: &str = "AccountLedger";
pub const ACCOUNT_PAYOUT: &str = "AccountPayout";
pub const APPROVE_WITHDRAWAL: &str = "ApproveWithdrawal";
pub const BALANCE: &str = "Balance";
pub const CANCEL_CHARGE: &str = "CancelCharge";
pub const CHARGE: &str = "Charge";
pub const CREATE_ACCOUNT: &str = "CreateAccount";
pub const DENY_WITHDRAWAL: &str = "DenyWithdrawal";
pub const DEPOSIT: &str = "Deposit";
pub const GET_WITHDRAWALS: &str = "GetWithdrawals";
pub const REFUND: &str = "Refund";
pub const REGISTER_ACCOUNT: &str = "RegisterAccount";
pub const REGISTER_ACCOUNT_PAYOUT: &str = "RegisterAccountPayout";
pub const SELECT_ACCOUNT: &str = "SelectAccount";
pub const SETTLEMENT_REPORT: &str = "ViewAutomaticSettlementDetailsCSV";
pub const WITHDRAW: &str = "Withdraw";

/// Inbound notification methods.
pub mod notification {
    pub const ACCOUNT: &str = "account";
    pub const CANCEL: &str = "cancel";
    pub const CREDIT: &str = "credit";
    pub const DEBIT: &str = "debit";
    pub const PAYOUT_CONFIRMATION: &str = "payoutconfirmation";
    pub const PENDING: &str = "pending";
}
