use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};

use crate::auth::{USER_ID_HEADER, USER_ROLE_HEADER};

/// Attaches the identity assertion the upstream gateway would add to a proxied request.
pub fn identify(req: TestRequest, user_id: &str, role: &str) -> TestRequest {
    req.insert_header((USER_ID_HEADER, user_id)).insert_header((USER_ROLE_HEADER, role))
}

pub async fn send_request<F: FnOnce(&mut ServiceConfig)>(req: TestRequest, configure: F) -> (StatusCode, String) {
    let _ = env_logger::try_init().ok();
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    let (_, res) = test::call_service(&service, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    (status, body)
}
