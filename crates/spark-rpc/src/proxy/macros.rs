//! `rpc_service!`：由一份接口声明生成服务 Trait、强类型代理与服务端骨架。
//!
//! # 设计背景（Why）
//! - 运行时动态代理在 Rust 中不可行，改为声明宏在编译期生成适配器，每个方法体只做“构造调用并委托”；
//! - 同一份声明同时产出客户端代理与服务端骨架，保证两侧方法名、参数顺序、类型名一致。
//!
//! # 语法（What）
//! ```ignore
//! spark_rpc::rpc_service! {
//!     pub trait Greeter("demo.Greeter") {
//!         fn greet(&self, name: String) -> String => greet_async;
//!         fn ping(&self) -> ();
//!     }
//!     pub proxy GreeterProxy;
//!     pub skeleton GreeterSkeleton;
//! }
//! ```
//! - 每个方法生成 `async fn method(&self, ..) -> Result<Ret, RpcError>`；
//! - 声明了 `=> name` 的方法额外在代理上生成 `fn name(&self, ..) -> ResponseFuture<Ret>`，
//!   按 `_async` 后缀约定分派；
//! - 骨架 `Skeleton<T>` 为任意实现了该 Trait 的 `T` 实现 [`ServiceDispatch`](crate::proxy::ServiceDispatch)。
//!
//! # 风险提示（Trade-offs）
//! - 参数类型需实现 `Serialize + DeserializeOwned + Send`，返回类型需实现 `Serialize + DeserializeOwned + Send + 'static`；
//! - 方法描述符中的类型名取自源码文本（`stringify!`），仅用于展示与重载解析。

/// 生成服务 Trait、代理与骨架，语法见模块文档。
#[macro_export]
macro_rules! rpc_service {
    (
        $(#[$service_attr:meta])*
        $vis:vis trait $service:ident ($interface:literal) {
            $(
                $(#[$method_attr:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)*) -> $ret:ty $(=> $future:ident)?;
            )*
        }
        $proxy_vis:vis proxy $proxy:ident;
        $skeleton_vis:vis skeleton $skeleton:ident;
    ) => {
        $(#[$service_attr])*
        #[$crate::async_trait]
        $vis trait $service: ::core::marker::Send + ::core::marker::Sync + 'static {
            $(
                $(#[$method_attr])*
                async fn $method(&self $(, $arg: $arg_ty)*) -> ::core::result::Result<$ret, $crate::RpcError>;
            )*
        }

        #[derive(Clone)]
        $proxy_vis struct $proxy {
            handler: $crate::proxy::InvocationHandler,
        }

        impl $crate::proxy::RpcProxy for $proxy {
            fn service_type() -> $crate::ServiceType {
                $crate::ServiceType::builder($interface)
                    $(.method(stringify!($method), &[$(stringify!($arg_ty)),*], stringify!($ret)))*
                    .build()
            }

            fn from_handler(handler: $crate::proxy::InvocationHandler) -> Self {
                Self { handler }
            }

            fn handler(&self) -> &$crate::proxy::InvocationHandler {
                &self.handler
            }
        }

        #[$crate::async_trait]
        impl $service for $proxy {
            $(
                async fn $method(&self $(, $arg: $arg_ty)*) -> ::core::result::Result<$ret, $crate::RpcError> {
                    let arguments = ::std::vec![$($crate::proxy::encode_value(&$arg)?),*];
                    let value = self.handler.call(stringify!($method), arguments).await?;
                    $crate::proxy::decode_value(value)
                }
            )*
        }

        impl $proxy {
            $(
                $crate::__rpc_service_future! {
                    $method ($($arg : $arg_ty),*) -> $ret $(=> $future)?
                }
            )*
        }

        impl ::core::fmt::Display for $proxy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.handler, f)
            }
        }

        impl ::core::fmt::Debug for $proxy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($proxy))
                    .field("handler", &self.handler)
                    .finish()
            }
        }

        impl ::core::cmp::PartialEq for $proxy {
            fn eq(&self, other: &Self) -> bool {
                self.handler == other.handler
            }
        }

        impl ::core::cmp::Eq for $proxy {}

        impl ::core::hash::Hash for $proxy {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                ::core::hash::Hash::hash(&self.handler, state);
            }
        }

        $skeleton_vis struct $skeleton<T>(pub T);

        #[$crate::async_trait]
        impl<T: $service> $crate::proxy::ServiceDispatch for $skeleton<T> {
            fn service_type(&self) -> $crate::ServiceType {
                <$proxy as $crate::proxy::RpcProxy>::service_type()
            }

            #[allow(unused_mut, unused_variables)]
            async fn dispatch(
                &self,
                method: &str,
                arguments: ::std::vec::Vec<$crate::Value>,
            ) -> ::core::result::Result<$crate::Value, $crate::RpcError> {
                let mut arguments = arguments.into_iter();
                match method {
                    $(
                        stringify!($method) => {
                            $(
                                let $arg: $arg_ty = $crate::proxy::take_argument(
                                    &mut arguments,
                                    stringify!($method),
                                    stringify!($arg),
                                )?;
                            )*
                            $crate::proxy::finish_arguments(arguments, stringify!($method))?;
                            let value = $service::$method(&self.0 $(, $arg)*).await?;
                            $crate::proxy::encode_value(&value)
                        }
                    )*
                    other => ::core::result::Result::Err($crate::RpcError::no_such_method($interface, other)),
                }
            }
        }
    };
}

/// `rpc_service!` 的内部辅助：为声明了 `=> name` 的方法生成 future 风格入口。
#[doc(hidden)]
#[macro_export]
macro_rules! __rpc_service_future {
    ($method:ident ($($arg:ident : $arg_ty:ty),*) -> $ret:ty => $future:ident) => {
        pub fn $future(&self $(, $arg: $arg_ty)*) -> $crate::proxy::ResponseFuture<$ret> {
            #[allow(unused_mut)]
            let mut arguments = ::std::vec::Vec::new();
            $(
                match $crate::proxy::encode_value(&$arg) {
                    ::core::result::Result::Ok(value) => arguments.push(value),
                    ::core::result::Result::Err(err) => {
                        return $crate::proxy::ResponseFuture::failed(err);
                    }
                }
            )*
            self.handler
                .call_future(::core::concat!(::core::stringify!($method), "_async"), arguments)
                .decode()
        }
    };
    ($method:ident ($($arg:ident : $arg_ty:ty),*) -> $ret:ty) => {};
}
