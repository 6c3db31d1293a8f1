//! Types used by the command wrappers
//!
//! Parameter enums map onto the exact strings the exchange expects; response
//! types cover the balance shapes the bootstrap check and callers rely on.
//! Everything else is returned as raw JSON.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PoloniexError;

/// Trading pair in exchange notation, `BASE_TARGET`
///
/// `BTC_ETH` quotes ETH in BTC: `base` is the currency prices are given in,
/// `target` the one being bought or sold.
///
/// # Example
///
/// ```
/// use poloniex_client::CurrencyPair;
///
/// let pair: CurrencyPair = "btc_eth".parse().unwrap();
/// assert_eq!(pair.base, "BTC");
/// assert_eq!(pair.to_string(), "BTC_ETH");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyPair {
    pub base: String,
    pub target: String,
}

impl CurrencyPair {
    /// Tickers are upper-cased
    pub fn new(base: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            target: target.into().to_uppercase(),
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base, self.target)
    }
}

impl FromStr for CurrencyPair {
    type Err = PoloniexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('_') {
            Some((base, target))
                if !base.is_empty() && !target.is_empty() && !target.contains('_') =>
            {
                Ok(Self::new(base, target))
            }
            _ => Err(PoloniexError::Decode(format!("Invalid currency pair: {}", s))),
        }
    }
}

impl TryFrom<String> for CurrencyPair {
    type Error = PoloniexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CurrencyPair> for String {
    fn from(pair: CurrencyPair) -> Self {
        pair.to_string()
    }
}

/// Pair selector for commands that also accept every market at once
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Market {
    All,
    Pair(CurrencyPair),
}

impl From<CurrencyPair> for Market {
    fn from(pair: CurrencyPair) -> Self {
        Market::Pair(pair)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::All => write!(f, "all"),
            Market::Pair(pair) => write!(f, "{}", pair),
        }
    }
}

/// Candle period accepted by `returnChartData`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartPeriod {
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    TwoHours,
    FourHours,
    OneDay,
}

impl ChartPeriod {
    pub fn seconds(&self) -> u32 {
        match self {
            ChartPeriod::FiveMinutes => 300,
            ChartPeriod::FifteenMinutes => 900,
            ChartPeriod::ThirtyMinutes => 1800,
            ChartPeriod::TwoHours => 7200,
            ChartPeriod::FourHours => 14400,
            ChartPeriod::OneDay => 86400,
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.seconds())
    }
}

/// Wallet an amount lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Account {
    Exchange,
    Margin,
    Lending,
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Account::Exchange => write!(f, "exchange"),
            Account::Margin => write!(f, "margin"),
            Account::Lending => write!(f, "lending"),
        }
    }
}

/// Execution flags for `buy`, `sell` and `moveOrder`
///
/// Only set flags are sent, each as `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderOptions {
    pub fill_or_kill: bool,
    pub immediate_or_cancel: bool,
    pub post_only: bool,
}

impl OrderOptions {
    pub fn fill_or_kill() -> Self {
        Self {
            fill_or_kill: true,
            ..Self::default()
        }
    }

    pub fn immediate_or_cancel() -> Self {
        Self {
            immediate_or_cancel: true,
            ..Self::default()
        }
    }

    pub fn post_only() -> Self {
        Self {
            post_only: true,
            ..Self::default()
        }
    }

    pub fn params(&self) -> Vec<(&'static str, &'static str)> {
        let mut params = Vec::new();
        if self.fill_or_kill {
            params.push(("fillOrKill", "1"));
        }
        if self.immediate_or_cancel {
            params.push(("immediateOrCancel", "1"));
        }
        if self.post_only {
            params.push(("postOnly", "1"));
        }
        params
    }
}

/// Inclusive time range, sent as Unix seconds in `start`/`end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The range ending now and covering `duration`
    pub fn last(duration: chrono::Duration) -> Self {
        let end = Utc::now();
        Self {
            start: end - duration,
            end,
        }
    }

    pub fn params(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.timestamp().to_string()),
            ("end", self.end.timestamp().to_string()),
        ]
    }
}

/// Entry of `returnCompleteBalances`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBalance {
    pub available: Decimal,
    pub on_orders: Decimal,
    pub btc_value: Decimal,
}

impl CompleteBalance {
    pub fn total(&self) -> Decimal {
        self.available + self.on_orders
    }
}

/// Balances, open orders and trade history fetched together
///
/// Built by [`PoloniexApi::account_snapshot`](crate::commands::PoloniexApi::account_snapshot).
/// Orders and trades are keyed by pair in the raw exchange shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub balances: HashMap<String, Decimal>,
    pub open_orders: Value,
    pub trade_history: Value,
}

impl AccountSnapshot {
    /// Balance of `currency`, zero when the exchange didn't list it
    pub fn balance(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or_default()
    }

    /// Currencies with a non-zero balance, sorted by ticker
    pub fn holdings(&self) -> Vec<(&str, Decimal)> {
        let mut held: Vec<(&str, Decimal)> = self
            .balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(currency, amount)| (currency.as_str(), *amount))
            .collect();
        held.sort_by(|a, b| a.0.cmp(b.0));
        held
    }

    /// Number of open orders across all pairs
    pub fn open_order_count(&self) -> usize {
        match &self.open_orders {
            Value::Object(by_pair) => by_pair
                .values()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .sum(),
            Value::Array(orders) => orders.len(),
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_pair_display() {
        let pair = CurrencyPair::new("btc", "Eth");
        assert_eq!(pair.base, "BTC");
        assert_eq!(pair.target, "ETH");
        assert_eq!(pair.to_string(), "BTC_ETH");
    }

    #[test]
    fn test_currency_pair_parse() {
        assert_eq!(
            "USDT_BTC".parse::<CurrencyPair>().unwrap(),
            CurrencyPair::new("USDT", "BTC")
        );
        assert!("BTCETH".parse::<CurrencyPair>().is_err());
        assert!("_ETH".parse::<CurrencyPair>().is_err());
        assert!("BTC_".parse::<CurrencyPair>().is_err());
        assert!("BTC_ETH_XMR".parse::<CurrencyPair>().is_err());
    }

    #[test]
    fn test_currency_pair_as_map_key() {
        let ticker: HashMap<CurrencyPair, Decimal> =
            serde_json::from_str(r#"{"BTC_ETH": "0.05", "BTC_XMR": "0.004"}"#).unwrap();
        assert_eq!(ticker[&CurrencyPair::new("BTC", "ETH")], dec!(0.05));

        let json = serde_json::to_string(&CurrencyPair::new("BTC", "XMR")).unwrap();
        assert_eq!(json, r#""BTC_XMR""#);
        assert!(serde_json::from_str::<CurrencyPair>(r#""nope""#).is_err());
    }

    #[test]
    fn test_market_display() {
        assert_eq!(Market::All.to_string(), "all");
        assert_eq!(Market::from(CurrencyPair::new("BTC", "ETH")).to_string(), "BTC_ETH");
    }

    #[test]
    fn test_account_snapshot_helpers() {
        let snapshot = AccountSnapshot {
            balances: [
                ("BTC".to_string(), dec!(0.5)),
                ("ETH".to_string(), dec!(0)),
                ("ALT".to_string(), dec!(12)),
            ]
            .into_iter()
            .collect(),
            open_orders: serde_json::json!({
                "BTC_ETH": [{"orderNumber": "1"}, {"orderNumber": "2"}],
                "BTC_XMR": [],
            }),
            trade_history: serde_json::json!({}),
        };

        assert_eq!(snapshot.balance("BTC"), dec!(0.5));
        assert_eq!(snapshot.balance("DOGE"), Decimal::ZERO);
        assert_eq!(snapshot.holdings(), vec![("ALT", dec!(12)), ("BTC", dec!(0.5))]);
        assert_eq!(snapshot.open_order_count(), 2);
    }

    #[test]
    fn test_chart_period_seconds() {
        assert_eq!(ChartPeriod::FiveMinutes.to_string(), "300");
        assert_eq!(ChartPeriod::TwoHours.seconds(), 7200);
        assert_eq!(ChartPeriod::OneDay.to_string(), "86400");
    }

    #[test]
    fn test_account_display() {
        assert_eq!(Account::Exchange.to_string(), "exchange");
        assert_eq!(Account::Margin.to_string(), "margin");
        assert_eq!(
            serde_json::to_string(&Account::Lending).unwrap(),
            r#""lending""#
        );
    }

    #[test]
    fn test_order_options() {
        assert!(OrderOptions::default().params().is_empty());
        assert_eq!(OrderOptions::post_only().params(), vec![("postOnly", "1")]);

        let both = OrderOptions {
            fill_or_kill: true,
            immediate_or_cancel: true,
            post_only: false,
        };
        assert_eq!(
            both.params(),
            vec![("fillOrKill", "1"), ("immediateOrCancel", "1")]
        );
    }

    #[test]
    fn test_time_range_params() {
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        );
        let params = range.params();
        assert_eq!(params[0], ("start", "1704067200".to_string()));
        assert_eq!(params[1], ("end", "1704153600".to_string()));
    }

    #[test]
    fn test_time_range_last() {
        let range = TimeRange::last(chrono::Duration::hours(1));
        assert_eq!(range.end - range.start, chrono::Duration::hours(1));
    }

    #[test]
    fn test_complete_balance_from_strings() {
        let balance: CompleteBalance = serde_json::from_str(
            r#"{"available":"5.015","onOrders":"1.0025","btcValue":"0.078"}"#,
        )
        .unwrap();

        assert_eq!(balance.available, dec!(5.015));
        assert_eq!(balance.on_orders, dec!(1.0025));
        assert_eq!(balance.total(), dec!(6.0175));
    }
}
