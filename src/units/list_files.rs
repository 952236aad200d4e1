//! Prefix listings

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::files::{random_suffix, remote_key};
use crate::common::{ResolvedConfiguration, Result};
use crate::connector::Connector;
use crate::testing::{EntryPoint, UnitDefinition};

const FILE_COUNT: usize = 3;

async fn list_prefix(s3: &dyn Connector, config: &ResolvedConfiguration) -> Result<bool> {
    let prefix = remote_key(&format!("list-{}/", random_suffix()));
    let expected: Vec<String> = (0..FILE_COUNT)
        .map(|i| format!("{}file-{}.txt", prefix, i))
        .collect();

    for key in &expected {
        s3.put_object(&config.bucket, key, key.clone().into_bytes()).await?;
    }

    let listed = s3.list_objects(&config.bucket, &prefix).await;

    for key in &expected {
        s3.delete_object(&config.bucket, key).await?;
    }

    let listed = listed?;
    if listed != expected {
        tracing::debug!(?expected, ?listed, "Listing mismatch");
    }
    Ok(listed == expected)
}

fn list<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    list_prefix(s3, config).boxed()
}

pub const LIST_FILES: UnitDefinition = UnitDefinition {
    name: "ListFiles",
    description: "List objects under a prefix",
    abstract_unit: false,
    entry_points: &[EntryPoint { name: "list_prefix", run: list }],
};
