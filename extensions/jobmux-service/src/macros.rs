/// Builds a `Service.Method#Version` job name at compile time.
///
/// ## Example
///
/// ```rust
/// use jobmux_service::service_job_name;
/// const NAME: &str = service_job_name!("Cloud", "ClientFileDownload", 1);
/// assert_eq!(NAME, "Cloud.ClientFileDownload#1");
/// ```
#[macro_export]
macro_rules! service_job_name {
    ($service:literal, $method:literal, $version:literal) => {
        concat!($service, ".", $method, "#", $version)
    };
}
