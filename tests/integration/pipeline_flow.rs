//! End-to-end stage transitions against a scripted provider.

use super::support::{
    acme_brief, asset_bundle, audit_report, in_prose, pipeline, voice_card, ScriptedProvider,
};
use brandline::documents::{Channel, StageDocument};
use brandline::error::{ProviderError, StageError};
use brandline::extract::ExtractionPath;
use brandline::provider::ResponseFormat;
use brandline::session::PipelineState;
use brandline::types::{CampaignBrief, SessionId, StageId};
use serde_json::json;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_full_campaign_reaches_audit_ready() {
    let provider = ScriptedProvider::new(vec![
        Ok(in_prose(&voice_card())),
        Ok(asset_bundle().to_string()),
        Ok(audit_report().to_string()),
    ]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();

    let voice = pipeline
        .generate_voice(&id, acme_brief(), &cancel)
        .await
        .unwrap();
    assert_eq!(voice.state, PipelineState::VoiceReady);
    assert_eq!(voice.extraction, ExtractionPath::Recovered);

    let assets = pipeline
        .generate_assets(&id, acme_brief(), &cancel)
        .await
        .unwrap();
    assert_eq!(assets.state, PipelineState::AssetsReady);
    assert_eq!(assets.extraction, ExtractionPath::Direct);
    assert!(assets.schema_gaps.is_empty());

    let audit = pipeline.generate_audit(&id, &cancel).await.unwrap();
    assert_eq!(audit.state, PipelineState::AuditReady);
    assert_eq!(audit.document, audit_report());
    assert!(audit.schema_gaps.is_empty());

    let session = pipeline.get_session(&id).unwrap();
    let card = session.voice_card().unwrap();
    assert_eq!(card.brand_name(), "Acme");
    assert_eq!(card.tone_traits(), vec!["energetic", "direct", "upbeat"]);

    let bundle = session.asset_bundle().unwrap();
    assert_eq!(bundle.emails().len(), 3);
    assert_eq!(bundle.social_posts(Channel::X).len(), 1);

    assert_eq!(bundle.landing_headline(), "Fresh in 60");
    assert_eq!(bundle.landing_sections()[0]["heading"], "How it works");
    assert_eq!(bundle.social_posts(Channel::Linkedin)[0]["hook"], "Fresh water, zero effort.");

    let report = session.audit_report().unwrap();
    let average = report.average_score().unwrap();
    assert!((1.0..=5.0).contains(&average));
    // One audit item per asset reference, in bundle order.
    let audited: Vec<String> = report.items().into_iter().map(|i| i.asset_id).collect();
    let refs: Vec<String> = bundle.asset_refs().into_iter().map(|r| r.path).collect();
    assert_eq!(refs.len(), 7);
    assert_eq!(audited, refs);
    assert!(report.unaudited(bundle).is_empty());
    assert_eq!(report.items()[6].score, Some(3));

    let calls = provider.calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.options.response_format, ResponseFormat::JsonObject);
        assert_eq!(call.model, "scripted-model");
    }
    // Assets see the stored voice card; the audit sees the asset paths.
    assert!(calls[1].messages[1].content.contains("Clean water without the scrubbing"));
    assert!(calls[2].messages[1].content.contains("- email_sequence[0] (email)"));
    assert!(calls[2].messages[1].content.contains("- social_posts.linkedin[0] (linkedin)"));
    assert!(calls[2].messages[1].content.contains("- landing_page (web)"));
}

#[tokio::test]
async fn test_run_stage_dispatches_by_stage_id() {
    let provider = ScriptedProvider::new(vec![
        Ok(voice_card().to_string()),
        Ok(asset_bundle().to_string()),
    ]);
    let pipeline = pipeline(&provider);
    let id = SessionId::from("campaign-42");
    let cancel = CancellationToken::new();

    for stage in [StageId::VoiceCard, StageId::Assets] {
        let output = pipeline
            .run_stage(stage, &id, acme_brief(), &cancel)
            .await
            .unwrap();
        assert_eq!(output.stage, stage);
        assert_eq!(output.session_id, id);
    }
    assert_eq!(
        pipeline.get_session(&id).unwrap().state(),
        PipelineState::AssetsReady
    );
}

#[tokio::test]
async fn test_regenerating_voice_keeps_downstream_documents() {
    let provider = ScriptedProvider::new(vec![
        Ok(voice_card().to_string()),
        Ok(asset_bundle().to_string()),
        Ok(audit_report().to_string()),
        Ok(json!({
            "brand": {"name": "Acme", "one_line_positioning": "Hydration, upgraded"},
            "voice": {"tone_traits": ["calm"]},
            "lexicon": {"use": [], "avoid": []},
            "style_rules": [],
            "guardrails": []
        })
        .to_string()),
    ]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();

    pipeline.generate_voice(&id, acme_brief(), &cancel).await.unwrap();
    pipeline.generate_assets(&id, acme_brief(), &cancel).await.unwrap();
    pipeline.generate_audit(&id, &cancel).await.unwrap();
    let before = pipeline.get_session(&id).unwrap();

    let output = pipeline
        .generate_voice(&id, acme_brief(), &cancel)
        .await
        .unwrap();
    assert_eq!(output.state, PipelineState::AuditReady);

    let after = pipeline.get_session(&id).unwrap();
    assert_eq!(after.voice_card().unwrap().positioning(), "Hydration, upgraded");
    assert_eq!(after.asset_bundle(), before.asset_bundle());
    assert_eq!(after.audit_report(), before.audit_report());
}

#[tokio::test]
async fn test_provider_failure_keeps_voice_ready() {
    let provider = ScriptedProvider::new(vec![
        Ok(voice_card().to_string()),
        Err(ProviderError::RateLimited("slow down".to_string())),
    ]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();

    pipeline.generate_voice(&id, acme_brief(), &cancel).await.unwrap();
    let err = pipeline
        .generate_assets(&id, acme_brief(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "provider_error");
    assert!(matches!(
        err,
        StageError::Provider(ProviderError::RateLimited(_))
    ));

    let session = pipeline.get_session(&id).unwrap();
    assert_eq!(session.state(), PipelineState::VoiceReady);
    assert!(session.asset_bundle().is_none());
}

#[tokio::test]
async fn test_audit_before_assets_is_a_precondition_error() {
    let provider = ScriptedProvider::new(vec![Ok(voice_card().to_string())]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();

    pipeline.generate_voice(&id, acme_brief(), &cancel).await.unwrap();
    let err = pipeline.generate_audit(&id, &cancel).await.unwrap_err();
    match err {
        StageError::Precondition { stage, missing } => {
            assert_eq!(stage, "audit");
            assert_eq!(missing, "asset bundle required");
        }
        other => panic!("expected precondition error, got {other:?}"),
    }
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_blank_product_description_never_reaches_provider() {
    let provider = ScriptedProvider::new(vec![]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();

    let brief = CampaignBrief::new("Acme", "", "", "   ");
    let err = pipeline
        .generate_voice(&id, brief, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "precondition_error");
    assert_eq!(provider.call_count(), 0);
    assert_eq!(
        pipeline.get_session(&id).unwrap().state(),
        PipelineState::Empty
    );
}

#[tokio::test]
async fn test_unparseable_voice_output_is_a_parse_error() {
    let provider = ScriptedProvider::new(vec![Ok(r#"{"brand": {"name": "Acme",}}"#.to_string())]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();

    let err = pipeline
        .generate_voice(&id, acme_brief(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "parse_error");
    assert!(pipeline.get_session(&id).unwrap().voice_card().is_none());
}

#[tokio::test]
async fn test_unknown_session_lookup() {
    let provider = ScriptedProvider::new(vec![]);
    let pipeline = pipeline(&provider);
    let err = pipeline
        .get_session(&SessionId::from("missing"))
        .unwrap_err();
    assert!(matches!(err, StageError::UnknownSession(id) if id == "missing"));
}

#[tokio::test]
async fn test_snapshot_serializes_every_document() {
    let provider = ScriptedProvider::new(vec![
        Ok(voice_card().to_string()),
        Ok(asset_bundle().to_string()),
    ]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();
    pipeline.generate_voice(&id, acme_brief(), &cancel).await.unwrap();
    pipeline.generate_assets(&id, acme_brief(), &cancel).await.unwrap();

    let snapshot: serde_json::Value =
        serde_json::from_str(&pipeline.get_session(&id).unwrap().to_pretty_json().unwrap())
            .unwrap();
    assert_eq!(snapshot["session_id"], json!(id.as_str()));
    assert_eq!(snapshot["voice_card"], voice_card());
    assert_eq!(snapshot["asset_bundle"], asset_bundle());
    assert!(snapshot["audit_report"].is_null());

    let bundle = pipeline.get_session(&id).unwrap();
    let bundle = bundle.asset_bundle().unwrap();
    assert_eq!(bundle.as_value(), &asset_bundle());
}

#[tokio::test]
async fn test_partial_audit_reports_unaudited_assets() {
    let mut partial = audit_report();
    partial["items"].as_array_mut().unwrap().truncate(5);
    let provider = ScriptedProvider::new(vec![
        Ok(voice_card().to_string()),
        Ok(asset_bundle().to_string()),
        Ok(partial.to_string()),
    ]);
    let pipeline = pipeline(&provider);
    let id = pipeline.create_session();
    let cancel = CancellationToken::new();

    pipeline.generate_voice(&id, acme_brief(), &cancel).await.unwrap();
    pipeline.generate_assets(&id, acme_brief(), &cancel).await.unwrap();
    let audit = pipeline.generate_audit(&id, &cancel).await.unwrap();

    assert_eq!(audit.state, PipelineState::AuditReady);
    assert_eq!(
        audit.schema_gaps,
        vec![
            "items (no entry for social_posts.x[0])",
            "items (no entry for landing_page)",
        ]
    );
}
