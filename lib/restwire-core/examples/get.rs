#![allow(dead_code)]

use std::time::Duration;

use restwire_core::{
    ClientConfig, ClientInterface, LoggingFilter, MethodDescriptor, ParamDecl, ResponseHeaders,
    RestClient, RestClientError, RetryPolicy,
};
use serde::Deserialize;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("restwire_core=debug")
        .pretty()
        .init();

    let config = ClientConfig::from_json_str(
        r#"{ "base-urls": { "dog-ceo": "http://dog.ceo/api" }, "timeout-ms": 5000 }"#,
    )?;

    let interface = ClientInterface::new("DogCeo")
        .with_property_key("dog-ceo")
        .method(
            MethodDescriptor::get("list_breeds", "/breeds/list")
                .header("Accept: application/json")
                .param(ParamDecl::response_headers("headers")),
        )
        .method(
            MethodDescriptor::get("breed_images", "/breed/{breed}/images")
                .param(ParamDecl::path("breed"))
                .retry(RetryPolicy::exponential(3, Duration::from_millis(200))),
        )
        .method(
            MethodDescriptor::get("random_image", "/breed/{breed}/images/random")
                .param(ParamDecl::path("breed"))
                .param(ParamDecl::callback("callback"))
                .asynchronous(),
        );

    let client = RestClient::builder()
        .with_config(config)
        .with_filter(LoggingFilter)
        .build(interface)?;

    // Simple get call with no parameters
    let headers = ResponseHeaders::new();
    let breeds = client
        .method("list_breeds")?
        .response_headers("headers", &headers)
        .call::<BreedsList>()?;
    println!("{breeds:?}");
    println!("content-type: {:?}", headers.get("content-type"));

    // Get call with a path parameter
    let images = client
        .method("breed_images")?
        .arg("breed", "hound")?
        .call::<BreedImages>()?;
    println!("{images:?}");

    // Async call, the outcome arrives on the callback
    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, rx) = tokio::sync::oneshot::channel::<Result<RandomImage, RestClientError>>();
    runtime.block_on(async {
        client
            .method("random_image")?
            .arg("breed", "hound")?
            .call_async(tx)?;
        let image = rx.await??;
        println!("{image:?}");
        anyhow::Ok(())
    })?;

    Ok(())
}

type BreedsList = DogCeoResult<Vec<String>>;

type BreedImages = DogCeoResult<Vec<String>>;

type RandomImage = DogCeoResult<String>;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum DogCeoResult<T> {
    Success { message: T },
    Error { code: u16, message: String },
}
