//! End-to-end account flow: the personal info screen of a customer account.
//!
//! The handler below is what an application would write: it resolves the htmx tab,
//! binds the `user` + `profile` composite, and on success saves it and redirects.

use hyper::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;
use vitrine::prelude::*;

const FULL_PAGE: &[&str] = &["accounts/account.html"];

struct PersonalInfoView {
	form: CompositeFormConfig<Record>,
	router: PartialRouter,
	redirect: RedirectAdapter,
}

/// What the handler hands to the template engine.
#[derive(Debug)]
struct Rendered {
	templates: Vec<String>,
	context: Context,
}

enum Outcome {
	Render(Rendered),
	Respond(Response),
}

impl PersonalInfoView {
	fn new() -> Self {
		let user = RecordSchema::new("user")
			.field(FieldSpec::char("first_name").max_length(150))
			.field(FieldSpec::char("last_name").max_length(150))
			.field(FieldSpec::email("email"));
		let profile = RecordSchema::new("profile")
			.field(FieldSpec::char("cpf").max_length(14))
			.field(FieldSpec::char("phone_number").max_length(20))
			.field(FieldSpec::char("gender").choices(["M", "F", "O"]))
			.field(FieldSpec::date("birth_date").optional());

		let form = CompositeFormConfig::new("PersonalInfoForm")
			.member("user", user.factory())
			.member("profile", profile.factory())
			.relate("profile", "user_id", "user")
			.clean(|cleaned| {
				let first = cleaned.get("user").and_then(|u| u.get("first_name"));
				let last = cleaned.get("user").and_then(|u| u.get("last_name"));
				if first.is_some() && first == last {
					return Err(ValidationError::new("First and last name must differ."));
				}
				Ok(())
			});

		let router = PartialRouter::builder("PersonalInfoView")
			.param("section")
			.route("personal", "accounts/_personal_info.html")
			.route("addresses", "accounts/_addresses.html")
			.default_route("personal")
			.build()
			.unwrap();

		Self {
			form,
			router,
			redirect: RedirectAdapter::new().with_redirect_url("/accounts/"),
		}
	}

	fn handle(&self, request: &Request, store: &InMemoryStore) -> Outcome {
		let resolution = match self.router.resolve(request) {
			Ok(resolution) => resolution,
			Err(error) => return Outcome::Respond(error.into()),
		};
		let mut form = match self.form.bind(CompositeInput::from_request(request)) {
			Ok(form) => form,
			Err(error) => {
				let error = vitrine::Error::ImproperlyConfigured(error.to_string());
				return Outcome::Respond(Response::from(error));
			}
		};

		if form.is_bound() && form.is_valid() {
			return match form.save(store).and_then(|saved| saved.finish()) {
				Ok(_) => Outcome::Respond(
					self.redirect
						.adapt(request, Response::see_other("/accounts/personal-info/")),
				),
				Err(error) => Outcome::Respond(
					Response::bad_request().with_body(error.to_string()),
				),
			};
		}

		let mut context = resolution.context.clone();
		context.insert("fields".to_string(), json!(form.fields()));
		context.insert("errors".to_string(), json!(form.errors()));
		Outcome::Render(Rendered {
			templates: resolution.template_names(FULL_PAGE),
			context,
		})
	}
}

#[fixture]
fn view() -> PersonalInfoView {
	PersonalInfoView::new()
}

fn submission(htmx: bool, body: &str) -> Request {
	let builder = Request::builder()
		.method(Method::POST)
		.uri("/accounts/personal-info/?section=personal")
		.form_body(body);
	let builder = if htmx { builder.htmx(false) } else { builder };
	builder.build().unwrap()
}

const VALID: &str = "user-first_name=Ana&user-last_name=Souza&user-email=ana%40example.com\
	&profile-cpf=123.456.789-09&profile-phone_number=%2B5511999990000\
	&profile-gender=F&profile-birth_date=1990-05-17";

#[rstest]
fn test_first_visit_renders_full_page(view: PersonalInfoView) {
	let request = Request::builder()
		.uri("/accounts/personal-info/")
		.build()
		.unwrap();

	let Outcome::Render(rendered) = view.handle(&request, &InMemoryStore::new()) else {
		panic!("expected a render");
	};

	assert_eq!(rendered.templates, vec!["accounts/account.html"]);
	assert_eq!(rendered.context[HTMX_KEY], json!("personal"));
	assert_eq!(rendered.context["fields"][0], json!("user-first_name"));
	assert_eq!(rendered.context["errors"], json!({}));
}

#[rstest]
fn test_tab_switch_renders_fragment(view: PersonalInfoView) {
	let request = Request::builder()
		.uri("/accounts/personal-info/?section=addresses")
		.htmx(false)
		.build()
		.unwrap();

	let Outcome::Render(rendered) = view.handle(&request, &InMemoryStore::new()) else {
		panic!("expected a render");
	};

	assert_eq!(rendered.templates, vec!["accounts/_addresses.html"]);
	assert_eq!(rendered.context[HTMX_KEY], json!("addresses"));
}

#[rstest]
fn test_unknown_tab_is_not_found(view: PersonalInfoView) {
	let request = Request::builder()
		.uri("/accounts/personal-info/?section=wishlist")
		.htmx(false)
		.build()
		.unwrap();

	let Outcome::Respond(response) = view.handle(&request, &InMemoryStore::new()) else {
		panic!("expected a response");
	};

	assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
fn test_valid_htmx_submission_saves_and_redirects_client(view: PersonalInfoView) {
	let store = InMemoryStore::new();

	let Outcome::Respond(response) = view.handle(&submission(true, VALID), &store) else {
		panic!("expected a response");
	};

	assert_eq!(response.status, StatusCode::OK);
	assert_eq!(response.client_redirect_target(), Some("/accounts/"));

	let user = &store.all("user")[0];
	let profile = &store.all("profile")[0];
	assert_eq!(user.get("email"), Some(&json!("ana@example.com")));
	assert_eq!(profile.get("user_id"), Some(&json!(user.pk().unwrap())));
	assert_eq!(profile.get("phone_number"), Some(&json!("+5511999990000")));
}

#[rstest]
fn test_valid_browser_submission_keeps_server_redirect(view: PersonalInfoView) {
	let store = InMemoryStore::new();

	let Outcome::Respond(response) = view.handle(&submission(false, VALID), &store) else {
		panic!("expected a response");
	};

	assert_eq!(response.status, StatusCode::SEE_OTHER);
	assert_eq!(response.location(), Some("/accounts/personal-info/"));
	assert_eq!(store.count("user"), 1);
}

#[rstest]
fn test_invalid_submission_rerenders_fragment_with_all_errors(view: PersonalInfoView) {
	let store = InMemoryStore::new();
	let body = "user-first_name=Ana&user-last_name=Ana&user-email=nope&profile-gender=X";

	let Outcome::Render(rendered) = view.handle(&submission(true, body), &store) else {
		panic!("expected a render");
	};

	assert_eq!(rendered.templates, vec!["accounts/_personal_info.html"]);
	let errors = &rendered.context["errors"];
	assert_eq!(errors["user-email"], json!(["Enter a valid email address."]));
	assert_eq!(errors["profile-cpf"], json!(["This field is required."]));
	assert_eq!(
		errors["profile-gender"],
		json!(["Select a valid choice. X is not one of the available choices."])
	);
	// `user` failed, so the name check never saw its data.
	assert!(errors.get(ALL_FIELDS_KEY).is_none());
	assert_eq!(store.count("user"), 0);
}

#[rstest]
fn test_crossform_error_blocks_save(view: PersonalInfoView) {
	let store = InMemoryStore::new();
	let body = VALID.replace("user-last_name=Souza", "user-last_name=Ana");

	let Outcome::Render(rendered) = view.handle(&submission(true, &body), &store) else {
		panic!("expected a render");
	};

	assert_eq!(
		rendered.context["errors"],
		json!({ "_all": ["First and last name must differ."] })
	);
	assert_eq!(store.count("user"), 0);
}

#[rstest]
fn test_profile_failure_leaves_no_user(view: PersonalInfoView) {
	let store = InMemoryStore::new().with_unique("profile", "cpf");
	let Outcome::Respond(_) = view.handle(&submission(true, VALID), &store) else {
		panic!("expected a response");
	};

	let again = VALID.replace("ana%40example.com", "bia%40example.com");
	let Outcome::Respond(response) = view.handle(&submission(true, &again), &store) else {
		panic!("expected a response");
	};

	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert_eq!(store.count("user"), 1);
	assert_eq!(store.count("profile"), 1);
}
