use std::any::Any;

/// Extracts a readable message from a panic payload.
///
/// Returns `"<unknown panic>"` for payloads that are neither `&str` nor `String`.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		return (*msg).to_string();
	}
	if let Some(msg) = payload.downcast_ref::<String>() {
		return msg.clone();
	}
	"<unknown panic>".to_string()
}

#[cfg(test)]
mod tests {
	use std::panic::AssertUnwindSafe;

	use futures::FutureExt;

	use super::panic_message;

	#[tokio::test]
	async fn extracts_static_str_payload() {
		let payload = AssertUnwindSafe(async { panic!("boom-str") }).catch_unwind().await.unwrap_err();
		let msg = panic_message(payload.as_ref());
		assert!(msg.contains("boom-str"), "expected 'boom-str', got: {msg}");
	}

	#[tokio::test]
	async fn extracts_string_payload() {
		let payload = AssertUnwindSafe(async { panic!("{}", String::from("boom-string")) })
			.catch_unwind()
			.await
			.unwrap_err();
		let msg = panic_message(payload.as_ref());
		assert!(msg.contains("boom-string"), "expected 'boom-string', got: {msg}");
	}

	#[test]
	fn falls_back_for_opaque_payloads() {
		let payload: Box<dyn std::any::Any + Send> = Box::new(17u8);
		assert_eq!(panic_message(payload.as_ref()), "<unknown panic>");
	}
}
