//! Upload and download small files (under 1 MiB) using single requests
//!
//! Three flavours share one round trip: the full one removes the remote
//! object afterwards, `NoDelete` leaves it in the bucket for inspection, and
//! `OnlyUpload` stops after the upload.

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use super::files::{
    create_random_file, download_and_verify_small, random_suffix, remote_key, upload_small, KB,
};
use crate::common::{ResolvedConfiguration, Result};
use crate::connector::Connector;
use crate::testing::{EntryPoint, UnitDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    NoDelete,
    OnlyUpload,
}

async fn round_trip(
    s3: &dyn Connector,
    config: &ResolvedConfiguration,
    label: &str,
    size: usize,
    mode: Mode,
) -> Result<bool> {
    let local = create_random_file(size)?;
    let remote = remote_key(&format!("small-{}-{}.dat", label, random_suffix()));

    upload_small(s3, local.path(), &config.bucket, &remote).await?;

    if mode == Mode::OnlyUpload {
        return Ok(true);
    }

    let verified = download_and_verify_small(s3, local.path(), &config.bucket, &remote).await?;

    if mode == Mode::Full {
        s3.delete_object(&config.bucket, &remote).await?;
    }

    Ok(verified)
}

fn upload_1kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "1kb", KB, Mode::Full).boxed()
}

fn upload_10kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "10kb", 10 * KB, Mode::Full).boxed()
}

fn upload_600kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "600kb", 600 * KB, Mode::Full).boxed()
}

fn keep_1kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "1kb", KB, Mode::NoDelete).boxed()
}

fn keep_10kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "10kb", 10 * KB, Mode::NoDelete).boxed()
}

fn keep_600kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "600kb", 600 * KB, Mode::NoDelete).boxed()
}

fn only_1kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "1kb", KB, Mode::OnlyUpload).boxed()
}

fn only_10kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "10kb", 10 * KB, Mode::OnlyUpload).boxed()
}

fn only_600kb<'a>(
    s3: &'a dyn Connector,
    config: &'a ResolvedConfiguration,
) -> BoxFuture<'a, Result<bool>> {
    round_trip(s3, config, "600kb", 600 * KB, Mode::OnlyUpload).boxed()
}

pub const SMALL_FILES: UnitDefinition = UnitDefinition {
    name: "SmallFiles",
    description: "Upload, download and delete small files",
    abstract_unit: false,
    entry_points: &[
        EntryPoint { name: "upload_1kb", run: upload_1kb },
        EntryPoint { name: "upload_10kb", run: upload_10kb },
        EntryPoint { name: "upload_600kb", run: upload_600kb },
    ],
};

pub const SMALL_FILES_NO_DELETE: UnitDefinition = UnitDefinition {
    name: "SmallFilesNoDelete",
    description: "Upload and download small files, leaving them in the bucket",
    abstract_unit: false,
    entry_points: &[
        EntryPoint { name: "upload_1kb", run: keep_1kb },
        EntryPoint { name: "upload_10kb", run: keep_10kb },
        EntryPoint { name: "upload_600kb", run: keep_600kb },
    ],
};

pub const SMALL_FILES_ONLY_UPLOAD: UnitDefinition = UnitDefinition {
    name: "SmallFilesOnlyUpload",
    description: "Upload small files without reading them back",
    abstract_unit: false,
    entry_points: &[
        EntryPoint { name: "upload_1kb", run: only_1kb },
        EntryPoint { name: "upload_10kb", run: only_10kb },
        EntryPoint { name: "upload_600kb", run: only_600kb },
    ],
};
