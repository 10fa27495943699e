//! Exchange-rate poller: fetch the central bank's currency list, track
//! USD/EUR/RUB, and offer a drafted rates post when anything moved.

use std::sync::Weak;

use serde::Deserialize;
use teloxide::Bot;
use tokio::time::{sleep, Duration};

use super::{offer_for_review, CycleError};
use crate::types::BotState;

const RATES_INTERVAL: Duration = Duration::from_secs(30 * 60);

const RATES_PROMPT: &str = concat!(
    "Ты — редактор Telegram-канала. Оформи официальные курсы валют ",
    "Национального банка Грузии в короткий аккуратный пост со списком ",
    "курсов. Числа не менять и не округлять. Без ссылок и хэштегов."
);

/// Shape of the NBG currencies endpoint: an array with one object per
/// date, each carrying the currency records.
#[derive(Deserialize)]
pub struct RatesPayload {
    pub currencies: Vec<CurrencyRecord>,
}

#[derive(Deserialize)]
pub struct CurrencyRecord {
    pub code: String,
    pub rate: f64,
    /// Some currencies are quoted per 100 or 1000 units (RUB is).
    #[serde(default = "one")]
    pub quantity: f64,
}

fn one() -> f64 {
    1.0
}

impl CurrencyRecord {
    /// GEL per one unit of the currency.
    fn per_unit(&self) -> f64 {
        if self.quantity > 0.0 {
            self.rate / self.quantity
        } else {
            self.rate
        }
    }
}

/// The three rates this bot publishes. Partial data is not publishable:
/// if any of the three is missing, the whole fetch counts as failed.
#[derive(Debug, PartialEq)]
pub struct TrackedRates {
    pub usd: f64,
    pub eur: f64,
    pub rub: f64,
}

impl TrackedRates {
    /// Deterministic composite the dedup cursor stores. Same rates in,
    /// same string out, across restarts.
    pub fn fingerprint(&self) -> String {
        format!(
            "USD={:.4};EUR={:.4};RUB={:.4}",
            self.usd, self.eur, self.rub
        )
    }

    /// Plain table handed to the LLM as drafting material.
    pub fn as_table(&self) -> String {
        format!(
            "1 USD = {:.4} GEL\n1 EUR = {:.4} GEL\n1 RUB = {:.4} GEL",
            self.usd, self.eur, self.rub
        )
    }
}

/// Pick the tracked currencies out of the payload. `None` when any of
/// the three is absent.
pub fn extract_tracked(payloads: &[RatesPayload]) -> Option<TrackedRates> {
    let records = &payloads.first()?.currencies;

    let mut usd = None;
    let mut eur = None;
    let mut rub = None;
    for record in records {
        match record.code.as_str() {
            "USD" => usd = Some(record.per_unit()),
            "EUR" => eur = Some(record.per_unit()),
            "RUB" => rub = Some(record.per_unit()),
            _ => {}
        }
    }

    Some(TrackedRates {
        usd: usd?,
        eur: eur?,
        rub: rub?,
    })
}

pub async fn rates_spinloop(bot: Bot, state: Weak<BotState>) {
    loop {
        let Some(state) = state.upgrade() else {
            return;
        };

        if let Err(e) = run_rates_cycle(&bot, &state).await {
            log::warn!("Rates cycle failed, skipping: {e}");
        }

        drop(state);
        sleep(RATES_INTERVAL).await;
    }
}

async fn run_rates_cycle(bot: &Bot, state: &BotState) -> Result<(), CycleError> {
    let payloads: Vec<RatesPayload> = state
        .http
        .get(&state.config.rates_url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(rates) = extract_tracked(&payloads) else {
        // Never publish partial data, and never advance the cursor on it.
        log::warn!("Rate payload was missing a tracked currency, skipping the cycle");
        return Ok(());
    };

    let fingerprint = rates.fingerprint();
    if state.rates_cursor.matches(&fingerprint) {
        log::debug!("Rates unchanged, skipping");
        return Ok(());
    }

    let draft = state.llm.complete(RATES_PROMPT, &rates.as_table()).await?;

    offer_for_review(bot, state, draft, &state.rates_cursor, &fingerprint).await?;
    log::info!("Offered a rates draft for review: {fingerprint}");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn payloads(json: &str) -> Vec<RatesPayload> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn nbg_shaped_payload() {
        let payloads = payloads(
            r#"[{
                "date": "2026-08-25T00:00:00.000Z",
                "currencies": [
                    {"code": "USD", "quantity": 1, "rate": 2.7065, "name": "US Dollar"},
                    {"code": "EUR", "quantity": 1, "rate": 2.9106},
                    {"code": "RUB", "quantity": 100, "rate": 3.1200},
                    {"code": "TRY", "quantity": 1, "rate": 0.0664}
                ]
            }]"#,
        );

        let rates = extract_tracked(&payloads).unwrap();
        assert_eq!(rates.usd, 2.7065);
        assert_eq!(rates.eur, 2.9106);
        // RUB is quoted per 100.
        assert!((rates.rub - 0.0312).abs() < 1e-9);
        assert_eq!(
            rates.fingerprint(),
            "USD=2.7065;EUR=2.9106;RUB=0.0312"
        );
    }

    #[test]
    fn missing_currency_fails_the_fetch() {
        let payloads = payloads(
            r#"[{"currencies": [
                {"code": "USD", "rate": 2.7},
                {"code": "EUR", "rate": 2.9}
            ]}]"#,
        );
        assert_eq!(extract_tracked(&payloads), None);
    }

    #[test]
    fn empty_payload_fails_the_fetch() {
        assert_eq!(extract_tracked(&[]), None);
        assert_eq!(extract_tracked(&payloads(r#"[{"currencies": []}]"#)), None);
    }

    #[test]
    fn fingerprint_is_stable() {
        let rates = TrackedRates {
            usd: 2.7,
            eur: 2.9,
            rub: 0.0312,
        };
        assert_eq!(rates.fingerprint(), rates.fingerprint());
        assert_eq!(rates.fingerprint(), "USD=2.7000;EUR=2.9000;RUB=0.0312");
    }
}
