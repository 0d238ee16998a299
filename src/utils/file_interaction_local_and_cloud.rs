use std::sync::Arc;
use bytes::Bytes;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use object_store::{ObjectStore, PutPayload, aws::AmazonS3Builder, local::LocalFileSystem, memory::InMemory, path::Path as ObjectPath};
use url::Url;

/// Prefix for in-process files registered through [`register_memory_file`].
pub const MEMORY_SCHEME: &str = "memory://";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Cache key for S3 stores that distinguishes between authenticated and anonymous access
#[derive(Hash, Eq, PartialEq, Clone, Debug)]
struct S3CacheKey {
    bucket: String,
    anonymous: bool,
}

/// Global cache for S3 stores, keyed by (bucket, anonymous) tuple.
///
/// Creating an S3 store resolves credentials (possibly through the EC2 metadata service), so
/// one store per bucket is kept for the life of the process. Credentials managed by the AWS
/// provider chain (instance roles, ECS/EKS roles, SSO) refresh underneath the cached store.
static S3_STORE_CACHE: Lazy<DashMap<S3CacheKey, Arc<dyn ObjectStore>>> =
    Lazy::new(DashMap::new);

/// Process-wide store backing every `memory://` path.
static MEMORY_STORE: Lazy<Arc<InMemory>> = Lazy::new(|| Arc::new(InMemory::new()));

/// Gets or creates a cached S3 store for the given bucket.
///
/// # Arguments
///
/// * `bucket` - S3 bucket name (without "s3://" prefix)
/// * `anonymous` - If true, uses unsigned requests (for public buckets)
///
/// # Errors
///
/// Returns an error if the store cannot be built (invalid bucket name, missing credentials
/// when `anonymous` is false).
pub fn get_cached_s3_store(
    bucket: &str,
    anonymous: bool
) -> Result<Arc<dyn ObjectStore>, BoxError> {
    let cache_key = S3CacheKey {
        bucket: bucket.to_string(),
        anonymous,
    };
    let entry = S3_STORE_CACHE.entry(cache_key);
    let store = entry.or_try_insert_with(|| {
        create_s3_store(bucket, anonymous)
    })?;
    Ok(Arc::clone(store.value()))
}

/// Creates an `ObjectStore` and path from a file path string.
///
/// Local files, S3 objects and in-process memory files are all read through the same
/// `ObjectStore` interface, so the engine streams and range-reads them identically.
///
/// # Supported Path Formats
///
/// * **S3**: `"s3://bucket/key"` or `"s3://bucket/key?anon=true"` → AWS S3 (cached by bucket)
/// * **Memory**: `"memory://name.csv"` → the process-wide in-memory store
/// * **Local**: absolute or relative paths → local filesystem
///
/// # Errors
///
/// Returns an error if:
/// * S3 URL is malformed or missing bucket name
/// * AWS credentials cannot be found (for S3 paths on first access to a bucket)
/// * Local path is invalid (Windows only - missing drive letter)
/// * Current directory cannot be determined (for relative paths)
///
/// # Examples
///
/// ```no_run
/// # use rowseek::utils::file_interaction_local_and_cloud::get_object_store;
/// # tokio_test::block_on(async {
/// let (store, path) = get_object_store("/home/user/data/big.csv").await.unwrap();
/// let (store, path) = get_object_store("./data/big.csv").await.unwrap();
/// let (store, path) = get_object_store("s3://my-bucket/exports/big.csv?anon=true").await.unwrap();
/// # });
/// ```
pub async fn get_object_store(
    file_path: &str,
) -> Result<(Arc<dyn ObjectStore>, ObjectPath), BoxError> {
    if file_path.starts_with("s3://") {
        let url = Url::parse(file_path)?;
        let bucket = url.host_str()
            .ok_or("Invalid S3 URL - no bucket specified")?;
        let key = url.path().trim_start_matches('/');

        // Check for anonymous access flag in query parameters
        let anonymous = url.query_pairs()
            .any(|(k, v)| k == "anon" && (v == "true" || v == "1"));

        let store = get_cached_s3_store(bucket, anonymous)?;
        let path = ObjectPath::from(key);

        Ok((store, path))
    } else if let Some(name) = file_path.strip_prefix(MEMORY_SCHEME) {
        let memory: Arc<InMemory> = Arc::clone(&*MEMORY_STORE);
        let store: Arc<dyn ObjectStore> = memory;
        Ok((store, ObjectPath::from(name)))
    } else {
        use std::path::Path as StdPath;

        let std_path = StdPath::new(file_path);
        let absolute_path = if std_path.is_absolute() {
            std_path.to_path_buf()
        } else {
            std::env::current_dir()?.join(std_path)
        };

        #[cfg(windows)]
        let (root, relative) = {
            let path_str = absolute_path.to_string_lossy();
            if let Some(pos) = path_str.find(":\\") {
                let root = format!("{}:\\", &path_str[..pos]);
                let relative = path_str[pos+2..].trim_start_matches('\\').replace('\\', "/");
                (root, relative)
            } else {
                return Err("Invalid Windows path".into());
            }
        };

        #[cfg(not(windows))]
        let (root, relative) = {
            let path_str = absolute_path.to_string_lossy();
            let relative = path_str.trim_start_matches('/');
            ("/".to_string(), relative.to_string())
        };

        let local_store = LocalFileSystem::new_with_prefix(root)?;
        let store: Arc<dyn ObjectStore> = Arc::new(local_store);
        let path = ObjectPath::from(relative);

        Ok((store, path))
    }
}

/// Installs `bytes` as the content of a `memory://` path.
///
/// Replaces any previous content at the same path. Engines that already hold a read handle on
/// that path see the new content on their next read, so register before opening.
///
/// ```
/// # use rowseek::utils::file_interaction_local_and_cloud::register_memory_file;
/// # tokio_test::block_on(async {
/// register_memory_file("memory://people.csv", "id,name\n1,ada\n".into()).await.unwrap();
/// # });
/// ```
pub async fn register_memory_file(path: &str, bytes: Bytes) -> Result<(), BoxError> {
    let name = path.strip_prefix(MEMORY_SCHEME)
        .ok_or_else(|| format!("Not a memory path: {}", path))?;
    MEMORY_STORE.put(&ObjectPath::from(name), PutPayload::from_bytes(bytes)).await?;
    Ok(())
}

/// Creates a reusable S3 `ObjectStore` for a specific bucket.
///
/// Credentials are resolved with `AmazonS3Builder::from_env()`, which checks environment
/// variables, the credentials file, and the instance/task/pod role providers in that order.
///
/// # Arguments
///
/// * `bucket` - S3 bucket name (without `"s3://"` prefix or trailing slashes)
/// * `anonymous` - If true, skips signing (for public buckets); if false, uses credentials
pub fn create_s3_store(
    bucket: &str,
    anonymous: bool
) -> Result<Arc<dyn ObjectStore>, BoxError> {
    let mut builder = AmazonS3Builder::from_env()
        .with_bucket_name(bucket);

    if anonymous {
        // Skip credential loading and request signing for public buckets
        builder = builder.with_skip_signature(true);
    }

    let s3_store = builder.build()?;
    Ok(Arc::new(s3_store))
}
