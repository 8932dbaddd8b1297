#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

//! Entry-point attribute macros for the rondo runtime.

mod entry;

/// Runs an `async fn main` on the thread's event loop.
///
/// The runtime is single-threaded, so unlike multi-threaded runtimes this
/// macro takes no flavor or worker-count arguments.
///
/// ```no_run
/// #[rondo::main]
/// async fn main() {
///     println!("running inside the event loop");
/// }
/// ```
///
/// Equivalent code not using `#[rondo::main]`:
///
/// ```no_run
/// fn main() {
///     rondo::block_on(async {
///         println!("running inside the event loop");
///     })
/// }
/// ```
#[proc_macro_attribute]
pub fn main(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    entry::expand(args.into(), item.into(), false).into()
}

/// Marks an `async fn` as a test driven by the event loop.
///
/// Each test gets the thread's loop for its own thread, so tests stay
/// isolated under the default per-thread test harness.
///
/// ```no_run
/// #[rondo::test]
/// async fn my_test() {
///     assert!(true);
/// }
/// ```
///
/// Equivalent code not using `#[rondo::test]`:
///
/// ```no_run
/// #[test]
/// fn my_test() {
///     rondo::block_on(async {
///         assert!(true);
///     })
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    args: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    entry::expand(args.into(), item.into(), true).into()
}
