use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    primitives::ByteStream as AwsByteStream,
    types::{ObjectCannedAcl, ServerSideEncryption as AwsServerSideEncryption},
    Client,
};

use crate::{BlobClient, BoxError, ByteStream, PutObjectRequest, ServerSideEncryption};

/// Connection settings for an S3-compatible endpoint (MinIO, LocalStack, RustFS)
#[derive(Debug, Clone)]
pub struct S3CompatibleConfig {
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: String,
}

/// Blob client backed by the AWS SDK for S3
#[derive(Clone)]
pub struct S3BlobClient {
    client: Client,
}

impl S3BlobClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the default AWS credential and region chain
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    /// Build a path-style client for an S3-compatible endpoint
    pub async fn s3_compatible(config: S3CompatibleConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key_id,
            config.secret_access_key,
            None,
            None,
            "dog-offload",
        );

        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .endpoint_url(config.endpoint_url)
            .load()
            .await;

        Self::new(Client::from_conf(
            aws_sdk_s3::config::Builder::from(&aws_config)
                .force_path_style(true)
                .build(),
        ))
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn map_encryption(sse: ServerSideEncryption) -> AwsServerSideEncryption {
        match sse {
            ServerSideEncryption::Aes256 => AwsServerSideEncryption::Aes256,
            ServerSideEncryption::AwsKms => AwsServerSideEncryption::AwsKms,
        }
    }
}

#[async_trait]
impl BlobClient for S3BlobClient {
    async fn put_object(&self, request: PutObjectRequest) -> Result<(), BoxError> {
        self.client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .body(AwsByteStream::from(request.body.into_bytes()))
            .set_server_side_encryption(request.server_side_encryption.map(Self::map_encryption))
            .set_ssekms_key_id(request.sse_kms_key_id)
            .set_acl(request.canned_acl.map(|acl| ObjectCannedAcl::from(acl.as_str())))
            .send()
            .await?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream, BoxError> {
        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        // Body read errors are deferred to the stream so callers can tell them apart.
        let body = result
            .body
            .collect()
            .await
            .map(|data| data.into_bytes())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        Ok(Box::pin(futures::stream::once(async move { body })))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BoxError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }
}
