/// Implements [`Record`](crate::Record) for a struct from its field list.
///
/// List the fields in declaration order. With `: Model` the four
/// auto-managed fields come first; the struct is expected to carry them
/// through `#[serde(flatten)] model: Model`.
///
/// ```ignore
/// #[derive(Debug, Serialize, Deserialize)]
/// struct Component {
///     #[serde(flatten)]
///     model: Model,
///     name: String,
///     project_id: i64,
/// }
///
/// sqlow::record!(Component: Model { name: String, project_id: i64 });
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ident : Model { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            #[allow(unused_mut)]
            fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                let mut fields = $crate::Model::fields();
                $(fields.push($crate::FieldDecl::of::<$fty>(stringify!($field)));)*
                fields
            }
        }
    };
    ($ty:ident { $($field:ident : $fty:ty),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn type_name() -> &'static str {
                stringify!($ty)
            }

            fn fields() -> ::std::vec::Vec<$crate::FieldDecl> {
                ::std::vec![$($crate::FieldDecl::of::<$fty>(stringify!($field))),*]
            }
        }
    };
}
