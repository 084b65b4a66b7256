use clap::Args;

use common::client::PrivateHashSession;

use super::{choose_leader, render, HashArgs, HashOpError};
use crate::cli::op::{Op, OpContext};

/// Ask every roster member for a hash of the URL sealed to a one-off key
#[derive(Args, Debug, Clone)]
pub struct Private {
    #[command(flatten)]
    pub args: HashArgs,
}

#[async_trait::async_trait]
impl Op for Private {
    type Error = HashOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let session = PrivateHashSession::new(self.args.load_roster()?, self.args.url.clone())?;
        let mut leader = choose_leader(&session.request().roster, ctx)?;

        let hashes = leader.client.hash_private(&session).await?;
        Ok(render(&leader, &hashes))
    }
}
