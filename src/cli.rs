//! Command-line surface: argument definitions and the command handlers
//! that tie forms, session, API client and views together.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{
    ApiClient, HealthRecord, MonitoringRelation, MonitoringRequest, Role, Sex, SmokingHistory,
};
use crate::config::ClientConfig;
use crate::dashboard::{fetch_profile, load_dashboard, Dashboard};
use crate::forms::{BasicInfoForm, LoginForm, RegisterForm, VitalsForm};
use crate::history::{load_history, HistoryView, Metric};
use crate::level::RiskLevel;
use crate::risk::{compute_risk_score, risk_breakdown, HealthProfile, RiskBreakdown};
use crate::session::{Session, SessionStore};

#[derive(Debug, Parser)]
#[command(
    name = "vitalwatch",
    version,
    about = "Track vital signs and follow your health risk score",
    long_about = "vitalwatch talks to the health backend: register or log in, keep your basic\n\
        information up to date, submit readings and look at the dashboard.\n\n\
        EXAMPLES:\n\
        \n  vitalwatch login --id kim@test.com --password pw\n\
        \n  vitalwatch record add --systolic 132 --diastolic 84 --glucose 105 --weight 71.5\n\
        \n  vitalwatch dashboard\n\
        \n  vitalwatch score --systolic 150 --diastolic 95 --glucose 140 --weight 70 --height 175"
)]
pub struct Cli {
    /// Increase verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Backend URL (overrides config and VITALWATCH_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and start a session
    Register(RegisterArgs),
    /// Log in and start a session
    Login(LoginArgs),
    /// End the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Basic health information (height, history, habits)
    #[command(subcommand)]
    Profile(ProfileCommand),
    /// Vital-sign records
    #[command(subcommand)]
    Record(RecordCommand),
    /// Risk score, level and last update
    Dashboard,
    /// Charts of the most recent records
    History(HistoryArgs),
    /// Score a reading locally, without the backend
    Score(ScoreArgs),
    /// Monitoring requests and relations between patients and monitors
    #[command(subcommand)]
    Monitor(MonitorCommand),
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "patient")]
    pub role: Role,
    /// Login id (default: <name>@test.com)
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, default_value = "")]
    pub id: String,
    #[arg(long, default_value = "")]
    pub password: String,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    Show,
    Set(ProfileSetArgs),
}

#[derive(Debug, Args)]
pub struct ProfileSetArgs {
    /// YYYY-MM-DD
    #[arg(long)]
    pub birth_date: NaiveDate,
    /// M or F
    #[arg(long)]
    pub sex: Sex,
    #[arg(long)]
    pub height: f64,
    #[arg(long)]
    pub hypertension: bool,
    #[arg(long)]
    pub diabetes: bool,
    #[arg(long)]
    pub heart_disease: bool,
    #[arg(long)]
    pub stroke_history: bool,
    /// smoker | past-smoker | non-smoker
    #[arg(long, default_value = "non-smoker")]
    pub smoking_history: SmokingHistory,
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    Add(VitalsArgs),
    List,
    Delete { record_id: String },
}

#[derive(Debug, Clone, Args)]
pub struct VitalsArgs {
    #[arg(long)]
    pub systolic: Option<i32>,
    #[arg(long)]
    pub diastolic: Option<i32>,
    #[arg(long)]
    pub glucose: Option<i32>,
    #[arg(long)]
    pub weight: Option<f64>,
    /// Cigarettes per day
    #[arg(long)]
    pub smoking: Option<i32>,
}

impl From<&VitalsArgs> for VitalsForm {
    fn from(a: &VitalsArgs) -> Self {
        VitalsForm {
            systolic_bp: a.systolic,
            diastolic_bp: a.diastolic,
            glucose_level: a.glucose,
            weight_kg: a.weight,
            smoking: a.smoking,
        }
    }
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[arg(long, value_enum, default_value_t = ChartArg::Bp)]
    pub chart: ChartArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChartArg {
    Bp,
    Glucose,
    Bmi,
    Risk,
}

impl From<ChartArg> for Metric {
    fn from(c: ChartArg) -> Self {
        match c {
            ChartArg::Bp => Metric::BloodPressure,
            ChartArg::Glucose => Metric::Glucose,
            ChartArg::Bmi => Metric::Bmi,
            ChartArg::Risk => Metric::Risk,
        }
    }
}

#[derive(Debug, Args)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub vitals: VitalsArgs,
    /// Enables the BMI term
    #[arg(long)]
    pub height: Option<f64>,
    #[arg(long)]
    pub hypertension: bool,
    #[arg(long)]
    pub diabetes: bool,
    #[arg(long)]
    pub heart_disease: bool,
    #[arg(long)]
    pub stroke_history: bool,
}

impl ScoreArgs {
    /// No profile at all unless at least one profile flag was given.
    fn profile(&self) -> Option<HealthProfile> {
        let p = HealthProfile {
            height_cm: self.height,
            hypertension: self.hypertension,
            diabetes: self.diabetes,
            heart_disease: self.heart_disease,
            stroke_history: self.stroke_history,
        };
        (p != HealthProfile::default()).then_some(p)
    }
}

#[derive(Debug, Subcommand)]
pub enum MonitorCommand {
    /// Ask a patient for permission to follow their records
    Request {
        #[arg(long)]
        patient: String,
    },
    /// Requests waiting for your answer
    Pending,
    /// Requests you have sent
    Sent,
    /// Withdraw a request you sent
    Cancel { request_id: String },
    /// Approve or reject a pending request
    Respond {
        request_id: String,
        #[arg(value_enum)]
        decision: Decision,
    },
    /// Who is monitoring you
    Relations,
    /// Patients you monitor
    Patients,
    /// End a monitoring relation
    Revoke { relation_id: String },
    /// Records of a patient you monitor
    Records {
        #[arg(long)]
        patient: String,
    },
    /// Latest record of a patient you monitor, with its risk score
    Latest {
        #[arg(long)]
        patient: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Serialize)]
struct ScoreOut {
    score: u8,
    level: RiskLevel,
    status: &'static str,
    breakdown: RiskBreakdown,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut cfg = ClientConfig::load_default()?;
    if let Some(url) = &cli.base_url {
        cfg.base_url = url.trim_end_matches('/').to_string();
    }
    let store = SessionStore::new(&cfg.session_path);
    let json = cli.json;
    // Building the client does not touch the network
    let api = ApiClient::new(&cfg)?;

    match cli.command {
        Command::Register(a) => {
            let req = RegisterForm {
                name: a.name,
                role: a.role,
                id: a.id,
                password: a.password,
            }
            .validate()?;
            let user = api.register(&req).await?;
            let session = Session::from_user(&user);
            store.save(&session)?;
            info!(user = %session.user_id, "registered");
            println!("registered {} ({}) as {}", user.name, user.id, user.role);
            println!("next: vitalwatch profile set ...");
        }
        Command::Login(a) => {
            let req = LoginForm {
                id: a.id,
                password: a.password,
            }
            .validate()?;
            let user = api.login(&req).await.context("login failed")?;
            let session = Session::from_user(&user);
            store.save(&session)?;
            info!(user = %session.user_id, "logged in");
            println!("logged in as {} ({})", user.name, user.role);
        }
        Command::Logout => {
            store.clear()?;
            println!("logged out");
        }
        Command::Whoami => match store.load()? {
            Some(s) if json => print_json(&s)?,
            Some(s) => {
                println!("{} [{}] {} ({})", s.initials(), s.user_id, s.user_name, s.role);
                if let Some(level) = s.risk_level {
                    println!("last risk level: {level}");
                }
            }
            None => println!("not logged in"),
        },
        Command::Profile(ProfileCommand::Show) => {
            let s = store.require()?;
            match api.get_health_profile(&s.user_id).await? {
                Some(p) if json => print_json(&p)?,
                Some(p) => {
                    println!("sex:            {}", or_dash(p.sex.map(|x| format!("{x:?}"))));
                    println!("birth date:     {}", or_dash(p.birth_date.map(|d| d.to_string())));
                    println!("height:         {}", or_dash(p.height_cm.map(|h| format!("{h} cm"))));
                    println!("hypertension:   {}", yes_no(p.hypertension));
                    println!("diabetes:       {}", yes_no(p.diabetes));
                    println!("heart disease:  {}", yes_no(p.heart_disease));
                    println!("stroke history: {}", yes_no(p.stroke_history));
                    println!(
                        "smoking:        {}",
                        or_dash(p.smoking_history.map(|x| format!("{x:?}")))
                    );
                }
                None => println!("no basic information yet; run `vitalwatch profile set`"),
            }
        }
        Command::Profile(ProfileCommand::Set(a)) => {
            let s = store.require()?;
            let update = BasicInfoForm {
                birth_date: a.birth_date,
                sex: a.sex,
                height_cm: a.height,
                hypertension: a.hypertension,
                diabetes: a.diabetes,
                heart_disease: a.heart_disease,
                stroke_history: a.stroke_history,
                smoking_history: a.smoking_history,
            }
            .into_update(&s.user_id)?;
            let saved = api.update_health_profile(&s.user_id, &update).await?;
            if json {
                print_json(&saved)?;
            } else {
                println!("basic information saved");
            }
        }
        Command::Record(RecordCommand::Add(a)) => {
            let s = store.require()?;
            let (saved, score) = add_record(&api, &s, VitalsForm::from(&a)).await?;
            if json {
                print_json(&serde_json::json!({ "record": saved, "risk_score": score }))?;
            } else {
                println!("record {} saved", saved.id);
                println!("risk score: {score} ({})", RiskLevel::from_score(score));
            }
        }
        Command::Record(RecordCommand::List) => {
            let s = store.require()?;
            let records = api.list_records(&s.user_id).await?;
            print_records(&records, json)?;
        }
        Command::Record(RecordCommand::Delete { record_id }) => {
            store.require()?;
            let deleted = api.delete_record(&record_id).await?;
            println!("deleted record {}", deleted.id);
        }
        Command::Dashboard => {
            let s = store.require()?;
            let dash = load_dashboard(&api, &s).await?;
            store.save(&s.with_risk_level(dash.level))?;
            if json {
                print_json(&dash)?;
            } else {
                print!("{}", render_dashboard(&dash));
            }
        }
        Command::History(a) => {
            let s = store.require()?;
            match load_history(&api, &s).await? {
                Some(view) if json => print_json(&view)?,
                Some(view) => print!("{}", render_history(&view, a.chart.into())),
                None => println!("no health records yet"),
            }
        }
        Command::Score(a) => score(&a, json)?,
        Command::Monitor(m) => monitor(&api, &store, m, json).await?,
    }
    Ok(())
}

/// Store a reading and score it. The record is written even when the basic
/// information is missing or cannot be fetched; the score then has no BMI or
/// comorbidity terms.
pub async fn add_record(
    api: &ApiClient,
    session: &Session,
    vitals: VitalsForm,
) -> Result<(HealthRecord, u8)> {
    let input = vitals.into_record(&session.user_id)?;
    let saved = api.create_record(&input).await?;

    let profile = fetch_profile(api, &session.user_id)
        .await
        .map(|p| p.to_profile());
    if profile.and_then(|p| p.height_cm).is_none() {
        warn!(user = %session.user_id, "no height on file; BMI not scored");
    }
    let score = compute_risk_score(&saved.reading(), profile.as_ref());
    info!(user = %session.user_id, record = %saved.id, score, "record saved");
    Ok((saved, score))
}

pub async fn monitor(
    api: &ApiClient,
    store: &SessionStore,
    cmd: MonitorCommand,
    json: bool,
) -> Result<()> {
    let s = store.require()?;
    match cmd {
        MonitorCommand::Request { patient } => {
            require_monitor_role(&s)?;
            let r = api.request_monitoring(&patient, &s.user_id).await?;
            println!("request {} sent to {} ({:?})", r.id, r.patient_name, r.status);
        }
        MonitorCommand::Pending => {
            let rows = api.pending_requests(&s.user_id).await?;
            print_requests(&rows, json)?;
        }
        MonitorCommand::Sent => {
            require_monitor_role(&s)?;
            let rows = api.sent_requests(&s.user_id).await?;
            print_requests(&rows, json)?;
        }
        MonitorCommand::Cancel { request_id } => {
            require_monitor_role(&s)?;
            api.cancel_request(&request_id).await?;
            println!("request {request_id} cancelled");
        }
        MonitorCommand::Respond {
            request_id,
            decision,
        } => {
            let approved = decision == Decision::Approve;
            let r = api.respond_to_request(&request_id, approved).await?;
            println!("request {} is now {:?}", r.id, r.status);
        }
        MonitorCommand::Relations => {
            let rows = api.relations(&s.user_id).await?;
            print_relations(&rows, json, |r| (&r.monitor_name, &r.monitor_role))?;
        }
        MonitorCommand::Patients => {
            let rows = api.my_patients(&s.user_id).await?;
            print_relations(&rows, json, |r| (&r.patient_name, &r.patient_id))?;
        }
        MonitorCommand::Revoke { relation_id } => {
            api.revoke_relation(&relation_id).await?;
            println!("relation {relation_id} revoked");
        }
        MonitorCommand::Records { patient } => {
            let rows = api.monitored_records(&s.user_id, &patient).await?;
            print_records(&rows, json)?;
        }
        MonitorCommand::Latest { patient } => {
            let Some(r) = api.monitored_latest_record(&s.user_id, &patient).await? else {
                println!("no health records yet");
                return Ok(());
            };
            let profile = fetch_profile(api, &patient).await.map(|p| p.to_profile());
            let score = compute_risk_score(&r.reading(), profile.as_ref());
            if json {
                print_json(&serde_json::json!({ "record": r, "risk_score": score }))?;
            } else {
                print_records(std::slice::from_ref(&r), false)?;
                println!("risk score: {score} ({})", RiskLevel::from_score(score));
            }
        }
    }
    Ok(())
}

fn require_monitor_role(s: &Session) -> Result<()> {
    if s.role == Role::Patient {
        bail!("only doctors and caregivers can request monitoring");
    }
    Ok(())
}

fn score(args: &ScoreArgs, json: bool) -> Result<()> {
    let reading = VitalsForm::from(&args.vitals).validate()?;
    let profile = args.profile();
    let b = risk_breakdown(&reading, profile.as_ref());
    let level = RiskLevel::from_score(b.score);
    if json {
        return print_json(&ScoreOut {
            score: b.score,
            level,
            status: level.status_description(),
            breakdown: b,
        });
    }
    println!("risk score: {} ({level})", b.score);
    println!("  systolic      {:>3}", b.systolic);
    println!("  diastolic     {:>3}", b.diastolic);
    println!("  glucose       {:>3}", b.glucose);
    println!("  smoking       {:>3}", b.smoking);
    println!("  bmi           {:>3}", b.bmi);
    println!("  comorbidities {:>3}", b.comorbidities);
    if b.raw > u32::from(b.score) {
        println!("  (sum {} capped)", b.raw);
    }
    println!("{}", level.status_description());
    Ok(())
}

pub fn render_dashboard(d: &Dashboard) -> String {
    let filled = (usize::from(d.risk_score) / 5).min(20);
    let gauge = format!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled));
    format!(
        "{} ({})\nrisk   {gauge} {}% {}\nstatus {}\nlast update {}\n",
        d.user_name,
        d.initials,
        d.risk_score,
        d.level.label().to_uppercase(),
        d.status,
        d.last_update
    )
}

pub fn render_history(v: &HistoryView, metric: Metric) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "BP {}  glucose {}  BMI {}  risk {} ({})\n\n",
        v.latest.blood_pressure,
        v.latest.glucose,
        v.latest
            .bmi
            .map(|b| format!("{b:.1}"))
            .unwrap_or_else(|| "-".into()),
        v.latest.risk_score,
        v.latest.risk_level
    ));
    let series = v.charts.series(metric);
    out.push_str(metric.label());
    out.push('\n');
    if series.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }
    let max = series.values.iter().cloned().fold(f64::MIN, f64::max).max(1.0);
    for (label, value) in series.labels.iter().zip(&series.values) {
        let width = ((value / max) * 40.0).round().max(0.0) as usize;
        out.push_str(&format!("{label:>6} {:<40} {value}\n", "*".repeat(width)));
    }
    out
}

fn print_records(records: &[HealthRecord], json: bool) -> Result<()> {
    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("no health records yet");
    }
    for r in records {
        println!(
            "{}  {}  BP {}/{}  glucose {}  weight {}  smoking {}  risk {}",
            r.id,
            r.created_at.format("%Y-%m-%d %H:%M"),
            r.systolic_bp,
            r.diastolic_bp,
            r.glucose_level,
            r.weight_kg,
            r.smoking,
            r.stroke_risk_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".into())
        );
    }
    Ok(())
}

fn print_requests(rows: &[MonitoringRequest], json: bool) -> Result<()> {
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("no pending requests");
    }
    for r in rows {
        println!(
            "{}  from {} ({})  {:?}  {}",
            r.id,
            r.requester_name,
            r.requester_role,
            r.status,
            r.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn print_relations<F>(rows: &[MonitoringRelation], json: bool, who: F) -> Result<()>
where
    F: Fn(&MonitoringRelation) -> (&String, &String),
{
    if json {
        return print_json(&rows);
    }
    if rows.is_empty() {
        println!("no monitoring relations");
    }
    for r in rows {
        let (name, extra) = who(r);
        println!(
            "{}  {name} ({extra})  since {}",
            r.id,
            r.granted_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(v: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

fn or_dash(v: Option<String>) -> String {
    v.unwrap_or_else(|| "-".into())
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}
