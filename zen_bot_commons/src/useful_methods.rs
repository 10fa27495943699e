use std::future::Future;

use teloxide::{requests::Requester, types::ChatId, types::Message, Bot, RequestError};

pub trait MessageStuff {
    /// Text of the message, or its caption if it's a media message.
    fn text_full(&self) -> Option<&str>;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }
}

pub trait BotStuff {
    fn typing(&self, to_where: ChatId) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn typing(&self, to_where: ChatId) -> Result<(), RequestError> {
        self.send_chat_action(to_where, teloxide::types::ChatAction::Typing)
            .await?;
        Ok(())
    }
}
