//! News poller: fetch the RSS feed, take the freshest entry, and offer
//! an LLM-drafted post for review unless we've already offered it.

use std::sync::Weak;

use teloxide::Bot;
use tokio::time::{sleep, Duration};

use super::{offer_for_review, CycleError};
use crate::types::BotState;

const NEWS_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

const NEWS_PROMPT: &str = concat!(
    "Ты — редактор новостного Telegram-канала. ",
    "Составь по заголовку и описанию короткий пост: два-три предложения, ",
    "нейтральный тон, без ссылок, без хэштегов и без выдуманных подробностей. ",
    "В конце одна уместная эмодзи."
);

/// One feed entry, reduced to what the pipeline needs. `id` is the
/// upstream guid, or the link when the feed has no guid.
#[derive(Debug, PartialEq, Eq)]
pub struct NewsEntry {
    pub id: String,
    pub title: String,
    pub summary: String,
}

/// Pull the first `<item>` out of an RSS payload. Feeds put the newest
/// entry first, and one candidate per cycle is all the pipeline wants.
/// This is a deliberately dumb scanner, not an XML parser; see the tests
/// for the shapes it handles.
pub fn parse_first_entry(xml: &str) -> Option<NewsEntry> {
    let item_start = xml.find("<item>").or_else(|| xml.find("<item "))?;
    let item = &xml[item_start..];
    let item_end = item.find("</item>")?;
    let item = &item[..item_end];

    let title = tag_text(item, "title").unwrap_or_default();
    let link = tag_text(item, "link").unwrap_or_default();
    let summary = tag_text(item, "description").unwrap_or_default();

    let id = match tag_text(item, "guid") {
        Some(guid) if !guid.is_empty() => guid,
        _ => link,
    };

    if id.is_empty() {
        return None;
    }

    Some(NewsEntry { id, title, summary })
}

/// Text content of the first `<tag>` or `<tag attr="...">` element,
/// with CDATA unwrapped and HTML entities decoded.
fn tag_text(fragment: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");

    let start = fragment.find(&open)?;
    let after_open = &fragment[start + open.len()..];
    let gt = after_open.find('>')?;
    if after_open[..gt].ends_with('/') {
        // Self-closing, no text.
        return None;
    }

    let body = &after_open[gt + 1..];
    let end = body.find(&close)?;
    let raw = body[..end].trim();

    let raw = raw
        .strip_prefix("<![CDATA[")
        .and_then(|inner| inner.strip_suffix("]]>"))
        .map(str::trim)
        .unwrap_or(raw);

    Some(html_escape::decode_html_entities(raw).into_owned())
}

pub async fn news_spinloop(bot: Bot, state: Weak<BotState>) {
    loop {
        let Some(state) = state.upgrade() else {
            // The dispatcher is gone; so are we.
            return;
        };

        if let Err(e) = run_news_cycle(&bot, &state).await {
            log::warn!("News cycle failed, skipping: {e}");
        }

        drop(state);
        sleep(NEWS_INTERVAL).await;
    }
}

async fn run_news_cycle(bot: &Bot, state: &BotState) -> Result<(), CycleError> {
    let body = state
        .http
        .get(&state.config.news_feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let Some(entry) = parse_first_entry(&body) else {
        log::debug!("News feed had no usable entries");
        return Ok(());
    };

    if state.news_cursor.matches(&entry.id) {
        log::debug!("Freshest news entry was already offered, skipping");
        return Ok(());
    }

    let user_prompt = format!("Заголовок: {}\n\nОписание: {}", entry.title, entry.summary);
    let draft = state.llm.complete(NEWS_PROMPT, &user_prompt).await?;

    offer_for_review(bot, state, draft, &state.news_cursor, &entry.id).await?;
    log::info!("Offered a news draft for review: {}", entry.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn plain_feed() {
        let xml = "
            <rss><channel>
            <title>Feed itself</title>
            <item>
                <title>Первая новость</title>
                <link>https://example.com/1</link>
                <description>Краткое описание.</description>
                <guid>item-guid-1</guid>
            </item>
            <item><title>Старая новость</title><guid>old</guid></item>
            </channel></rss>";

        let entry = parse_first_entry(xml).unwrap();
        assert_eq!(entry.id, "item-guid-1");
        assert_eq!(entry.title, "Первая новость");
        assert_eq!(entry.summary, "Краткое описание.");
    }

    #[test]
    fn cdata_attributes_and_entities() {
        let xml = r#"<item>
            <title><![CDATA[Рост &amp; падение]]></title>
            <link>https://example.com/2</link>
            <description>Подробности &quot;тут&quot;</description>
            <guid isPermaLink="false">guid-2</guid>
        </item>"#;

        let entry = parse_first_entry(xml).unwrap();
        assert_eq!(entry.id, "guid-2");
        assert_eq!(entry.title, "Рост & падение");
        assert_eq!(entry.summary, "Подробности \"тут\"");
    }

    #[test]
    fn link_substitutes_for_missing_guid() {
        let xml = "<item><title>Без guid</title><link>https://example.com/3</link></item>";
        assert_eq!(parse_first_entry(xml).unwrap().id, "https://example.com/3");
    }

    #[test]
    fn no_items_no_entry() {
        assert_eq!(parse_first_entry("<rss><channel></channel></rss>"), None);
        assert_eq!(parse_first_entry(""), None);
        // An item with neither guid nor link can't be deduplicated.
        assert_eq!(parse_first_entry("<item><title>x</title></item>"), None);
    }
}
