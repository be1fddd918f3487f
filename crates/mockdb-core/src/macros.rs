/// Build an [`Attrs`](crate::value::Attrs) payload from `key => value`
/// pairs, in order.
///
/// ```ignore
/// let user = users.create(attrs! { "name" => "Ada", "admin" => true })?;
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        ::std::vec::Vec::<(::std::string::String, $crate::value::Value)>::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        ::std::vec![$((
            ::std::string::String::from($key),
            $crate::value::Value::from($value),
        )),+]
    };
}
