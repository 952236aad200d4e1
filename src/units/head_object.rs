//! Object metadata lookups

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::files::{random_suffix, remote_key, KB};
use crate::common::{Error, ResolvedConfiguration, Result};
use crate::connector::Connector;
use crate::testing::{EntryPoint, UnitDefinition};

async fn head_existing(s3: &dyn Connector, config: &ResolvedConfiguration) -> Result<bool> {
    let remote = remote_key(&format!("head-{}.dat", random_suffix()));
    s3.put_object(&config.bucket, &remote, vec![0x5a; KB]).await?;

    let info = s3.head_object(&config.bucket, &remote).await;
    s3.delete_object(&config.bucket, &remote).await?;

    match info? {
        Some(info) if info.size == KB as u64 => Ok(true),
        Some(info) => Err(Error::Verification(format!(
            "expected {} bytes for '{}', HEAD reported {}",
            KB, remote, info.size
        ))),
        None => Err(Error::object_not_found(&config.bucket, &remote)),
    }
}

async fn head_missing(s3: &dyn Connector, config: &ResolvedConfiguration) -> Result<bool> {
    let remote = remote_key(&format!("missing-{}.dat", random_suffix()));
    Ok(s3.head_object(&config.bucket, &remote).await?.is_none())
}

fn existing<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    head_existing(s3, config).boxed()
}

fn missing<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    head_missing(s3, config).boxed()
}

pub const HEAD_OBJECT: UnitDefinition = UnitDefinition {
    name: "HeadObject",
    description: "Object metadata for existing and missing keys",
    abstract_unit: false,
    entry_points: &[
        EntryPoint { name: "existing", run: existing },
        EntryPoint { name: "missing", run: missing },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::MemoryConnector;

    #[tokio::test]
    async fn test_head_entry_points_pass() {
        let s3 = MemoryConnector::new();
        let config = ResolvedConfiguration::default();
        assert!(existing(&s3, &config).await.unwrap());
        assert!(missing(&s3, &config).await.unwrap());
        assert!(s3.is_empty());
    }
}
