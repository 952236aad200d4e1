//! Upload and download files larger than one multipart chunk

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::files::{
    create_random_file, download_and_verify_big, random_suffix, remote_key, upload_big, MB,
};
use crate::common::{ResolvedConfiguration, Result};
use crate::connector::Connector;
use crate::testing::{EntryPoint, UnitDefinition};

async fn multipart_round_trip(
    s3: &dyn Connector,
    config: &ResolvedConfiguration,
    label: &str,
    size: usize,
) -> Result<bool> {
    let local = create_random_file(size)?;
    let remote = remote_key(&format!("big-{}-{}.dat", label, random_suffix()));

    upload_big(s3, local.path(), &config.bucket, &remote).await?;
    let verified = download_and_verify_big(s3, local.path(), &config.bucket, &remote).await?;
    s3.delete_object(&config.bucket, &remote).await?;

    Ok(verified)
}

fn upload_6mb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    multipart_round_trip(s3, config, "6mb", 6 * MB).boxed()
}

fn upload_11mb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    multipart_round_trip(s3, config, "11mb", 11 * MB).boxed()
}

pub const BIG_FILES: UnitDefinition = UnitDefinition {
    name: "BigFiles",
    description: "Multipart upload and hash-verified download of large files",
    abstract_unit: false,
    entry_points: &[
        EntryPoint { name: "upload_6mb", run: upload_6mb },
        EntryPoint { name: "upload_11mb", run: upload_11mb },
    ],
};
