use clap::Args;

use common::client::PublicHashSession;

use super::{choose_leader, render, HashArgs, HashOpError};
use crate::cli::op::{Op, OpContext};

/// Ask every roster member for a signed hash of the URL
#[derive(Args, Debug, Clone)]
pub struct Public {
    #[command(flatten)]
    pub args: HashArgs,
}

#[async_trait::async_trait]
impl Op for Public {
    type Error = HashOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let session = PublicHashSession::new(self.args.load_roster()?, self.args.url.clone())?;
        let mut leader = choose_leader(&session.request().roster, ctx)?;

        let hashes = leader.client.hash_public(&session).await?;
        Ok(render(&leader, &hashes))
    }
}
