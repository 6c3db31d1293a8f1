//! Poloniex command catalog and wrapper methods
//!
//! Each wrapper only maps its arguments to a `(command, params, requires_auth)`
//! triple and hands it to [`Exchange::execute_command`]. Pacing, signing and
//! retry all happen behind that call.
//!
//! # Example
//!
//! ```no_run
//! use poloniex_client::{CurrencyPair, OrderOptions, PoloniexApi, PoloniexClient};
//! use rust_decimal::Decimal;
//! use std::str::FromStr;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PoloniexClient::from_env()?;
//!
//!     let pair = CurrencyPair::new("BTC", "ETH");
//!     let rate = Decimal::from_str("0.05")?;
//!     let amount = Decimal::from_str("10")?;
//!     let order = client
//!         .buy(&pair, rate, amount, OrderOptions::post_only())
//!         .await?;
//!     println!("Order: {}", order["orderNumber"]);
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::client::Exchange;
use crate::error::PoloniexResult;
use crate::types::{
    Account, AccountSnapshot, ChartPeriod, CompleteBalance, CurrencyPair, Market, OrderOptions,
    TimeRange,
};

/// Every command the client knows how to send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // Public
    ReturnTicker,
    Return24Volume,
    ReturnOrderBook,
    ReturnChartData,
    ReturnLoanOrders,
    // Trading
    ReturnBalances,
    ReturnCompleteBalances,
    ReturnDepositAddresses,
    GenerateNewAddress,
    ReturnDepositsWithdrawals,
    ReturnOpenOrders,
    ReturnTradeHistory,
    Buy,
    Sell,
    CancelOrder,
    MoveOrder,
    Withdraw,
    ReturnFeeInfo,
    ReturnAvailableAccountBalances,
    ReturnTradableBalances,
    TransferBalance,
    ReturnMarginAccountSummary,
    ReturnOpenLoanOffers,
    ReturnActiveLoans,
}

impl Command {
    pub const ALL: [Command; 24] = [
        Command::ReturnTicker,
        Command::Return24Volume,
        Command::ReturnOrderBook,
        Command::ReturnChartData,
        Command::ReturnLoanOrders,
        Command::ReturnBalances,
        Command::ReturnCompleteBalances,
        Command::ReturnDepositAddresses,
        Command::GenerateNewAddress,
        Command::ReturnDepositsWithdrawals,
        Command::ReturnOpenOrders,
        Command::ReturnTradeHistory,
        Command::Buy,
        Command::Sell,
        Command::CancelOrder,
        Command::MoveOrder,
        Command::Withdraw,
        Command::ReturnFeeInfo,
        Command::ReturnAvailableAccountBalances,
        Command::ReturnTradableBalances,
        Command::TransferBalance,
        Command::ReturnMarginAccountSummary,
        Command::ReturnOpenLoanOffers,
        Command::ReturnActiveLoans,
    ];

    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::ReturnTicker => "returnTicker",
            Command::Return24Volume => "return24Volume",
            Command::ReturnOrderBook => "returnOrderBook",
            Command::ReturnChartData => "returnChartData",
            Command::ReturnLoanOrders => "returnLoanOrders",
            Command::ReturnBalances => "returnBalances",
            Command::ReturnCompleteBalances => "returnCompleteBalances",
            Command::ReturnDepositAddresses => "returnDepositAddresses",
            Command::GenerateNewAddress => "generateNewAddress",
            Command::ReturnDepositsWithdrawals => "returnDepositsWithdrawals",
            Command::ReturnOpenOrders => "returnOpenOrders",
            Command::ReturnTradeHistory => "returnTradeHistory",
            Command::Buy => "buy",
            Command::Sell => "sell",
            Command::CancelOrder => "cancelOrder",
            Command::MoveOrder => "moveOrder",
            Command::Withdraw => "withdraw",
            Command::ReturnFeeInfo => "returnFeeInfo",
            Command::ReturnAvailableAccountBalances => "returnAvailableAccountBalances",
            Command::ReturnTradableBalances => "returnTradableBalances",
            Command::TransferBalance => "transferBalance",
            Command::ReturnMarginAccountSummary => "returnMarginAccountSummary",
            Command::ReturnOpenLoanOffers => "returnOpenLoanOffers",
            Command::ReturnActiveLoans => "returnActiveLoans",
        }
    }

    /// Whether the command goes to the signed trading endpoint
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Command::ReturnTicker
                | Command::Return24Volume
                | Command::ReturnOrderBook
                | Command::ReturnChartData
                | Command::ReturnLoanOrders
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn borrowed<'a>(params: &'a [(&'static str, String)]) -> Vec<(&'static str, &'a str)> {
    params.iter().map(|(k, v)| (*k, v.as_str())).collect()
}

/// Typed wrappers for every [`Command`], available on any [`Exchange`]
#[async_trait]
pub trait PoloniexApi: Exchange {
    /// Send a catalogued command, taking authentication from the catalog
    async fn call(&self, command: Command, params: &[(&str, &str)]) -> PoloniexResult<Value> {
        self.execute_command(command.as_str(), params, command.requires_auth())
            .await
    }

    // ==================== PUBLIC COMMANDS ====================

    async fn return_ticker(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnTicker, &[]).await
    }

    async fn return_24_volume(&self) -> PoloniexResult<Value> {
        self.call(Command::Return24Volume, &[]).await
    }

    /// Order book for one pair or every market
    async fn return_order_book(&self, market: &Market, depth: u32) -> PoloniexResult<Value> {
        let market = market.to_string();
        let depth = depth.to_string();
        self.call(
            Command::ReturnOrderBook,
            &[("currencyPair", market.as_str()), ("depth", depth.as_str())],
        )
        .await
    }

    /// Candles for a pair over a time range
    async fn return_chart_data(
        &self,
        currency_pair: &CurrencyPair,
        period: ChartPeriod,
        range: TimeRange,
    ) -> PoloniexResult<Value> {
        let mut params = vec![("currencyPair", currency_pair.to_string())];
        params.push(("period", period.to_string()));
        params.extend(range.params());
        self.call(Command::ReturnChartData, &borrowed(&params)).await
    }

    async fn return_loan_orders(&self, currency: &str) -> PoloniexResult<Value> {
        self.call(Command::ReturnLoanOrders, &[("currency", currency)])
            .await
    }

    // ==================== TRADING COMMANDS ====================

    async fn return_balances(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnBalances, &[]).await
    }

    /// Balances parsed into decimals
    async fn balances(&self) -> PoloniexResult<HashMap<String, Decimal>> {
        let value = self.return_balances().await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Available, on-orders and BTC value per currency, optionally for every account
    async fn return_complete_balances(&self, all_accounts: bool) -> PoloniexResult<Value> {
        if all_accounts {
            self.call(Command::ReturnCompleteBalances, &[("account", "all")])
                .await
        } else {
            self.call(Command::ReturnCompleteBalances, &[]).await
        }
    }

    async fn complete_balances(&self) -> PoloniexResult<HashMap<String, CompleteBalance>> {
        let value = self.return_complete_balances(false).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn return_deposit_addresses(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnDepositAddresses, &[]).await
    }

    async fn generate_new_address(&self, currency: &str) -> PoloniexResult<Value> {
        self.call(Command::GenerateNewAddress, &[("currency", currency)])
            .await
    }

    async fn return_deposits_withdrawals(&self, range: TimeRange) -> PoloniexResult<Value> {
        let params = range.params();
        self.call(Command::ReturnDepositsWithdrawals, &borrowed(&params))
            .await
    }

    /// Open orders for one pair or every market
    async fn return_open_orders(&self, market: &Market) -> PoloniexResult<Value> {
        let market = market.to_string();
        self.call(Command::ReturnOpenOrders, &[("currencyPair", market.as_str())])
            .await
    }

    async fn return_trade_history(
        &self,
        market: &Market,
        range: Option<TimeRange>,
    ) -> PoloniexResult<Value> {
        let mut params = vec![("currencyPair", market.to_string())];
        if let Some(range) = range {
            params.extend(range.params());
        }
        self.call(Command::ReturnTradeHistory, &borrowed(&params))
            .await
    }

    async fn buy(
        &self,
        currency_pair: &CurrencyPair,
        rate: Decimal,
        amount: Decimal,
        options: OrderOptions,
    ) -> PoloniexResult<Value> {
        let params = order_params(currency_pair, rate, amount, options);
        self.call(Command::Buy, &borrowed(&params)).await
    }

    async fn sell(
        &self,
        currency_pair: &CurrencyPair,
        rate: Decimal,
        amount: Decimal,
        options: OrderOptions,
    ) -> PoloniexResult<Value> {
        let params = order_params(currency_pair, rate, amount, options);
        self.call(Command::Sell, &borrowed(&params)).await
    }

    async fn cancel_order(&self, order_number: &str) -> PoloniexResult<Value> {
        self.call(Command::CancelOrder, &[("orderNumber", order_number)])
            .await
    }

    /// Cancel and replace an order; `amount` keeps the original size when `None`
    async fn move_order(
        &self,
        order_number: &str,
        rate: Decimal,
        amount: Option<Decimal>,
        options: OrderOptions,
    ) -> PoloniexResult<Value> {
        let mut params = vec![
            ("orderNumber", order_number.to_string()),
            ("rate", rate.to_string()),
        ];
        if let Some(amount) = amount {
            params.push(("amount", amount.to_string()));
        }
        // fillOrKill is not accepted by moveOrder
        let options = OrderOptions {
            fill_or_kill: false,
            ..options
        };
        params.extend(options.params().into_iter().map(|(k, v)| (k, v.to_string())));
        self.call(Command::MoveOrder, &borrowed(&params)).await
    }

    async fn withdraw(
        &self,
        currency: &str,
        amount: Decimal,
        address: &str,
        payment_id: Option<&str>,
    ) -> PoloniexResult<Value> {
        let amount = amount.to_string();
        let mut params = vec![
            ("currency", currency),
            ("amount", amount.as_str()),
            ("address", address),
        ];
        if let Some(payment_id) = payment_id {
            params.push(("paymentId", payment_id));
        }
        self.call(Command::Withdraw, &params).await
    }

    async fn return_fee_info(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnFeeInfo, &[]).await
    }

    async fn return_available_account_balances(
        &self,
        account: Option<Account>,
    ) -> PoloniexResult<Value> {
        match account {
            Some(account) => {
                let account = account.to_string();
                let params = [("account", account.as_str())];
                self.call(Command::ReturnAvailableAccountBalances, &params)
                    .await
            }
            None => self.call(Command::ReturnAvailableAccountBalances, &[]).await,
        }
    }

    async fn return_tradable_balances(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnTradableBalances, &[]).await
    }

    async fn transfer_balance(
        &self,
        currency: &str,
        amount: Decimal,
        from: Account,
        to: Account,
    ) -> PoloniexResult<Value> {
        let params = vec![
            ("currency", currency.to_string()),
            ("amount", amount.to_string()),
            ("fromAccount", from.to_string()),
            ("toAccount", to.to_string()),
        ];
        self.call(Command::TransferBalance, &borrowed(&params)).await
    }

    async fn return_margin_account_summary(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnMarginAccountSummary, &[]).await
    }

    async fn return_open_loan_offers(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnOpenLoanOffers, &[]).await
    }

    async fn return_active_loans(&self) -> PoloniexResult<Value> {
        self.call(Command::ReturnActiveLoans, &[]).await
    }

    // ==================== ACCOUNT ====================

    /// Balances, open orders and full trade history across every market
    ///
    /// Three sequential calls; the first failure is returned.
    async fn account_snapshot(&self) -> PoloniexResult<AccountSnapshot> {
        let balances = self.balances().await?;
        let open_orders = self.return_open_orders(&Market::All).await?;
        let trade_history = self.return_trade_history(&Market::All, None).await?;

        Ok(AccountSnapshot {
            balances,
            open_orders,
            trade_history,
        })
    }
}

impl<E: Exchange> PoloniexApi for E {}

fn order_params(
    currency_pair: &CurrencyPair,
    rate: Decimal,
    amount: Decimal,
    options: OrderOptions,
) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("currencyPair", currency_pair.to_string()),
        ("rate", rate.to_string()),
        ("amount", amount.to_string()),
    ];
    params.extend(options.params().into_iter().map(|(k, v)| (k, v.to_string())));
    params
}
