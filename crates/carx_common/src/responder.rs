//! Response Generator v2.5.1
//!
//! One request, one structured reply:
//!
//! ```text
//! analyze -> emergency? -> emergency template (contacts + shops + safety)
//!         -> else dispatch on intent -> diagnostic | maintenance | cost | information
//!         -> merge due-service reminders -> recommendations
//! ```
//!
//! Any `CarxError` raised by a handler is turned into an error reply here.
//! The error detail goes to the log; the user only sees an apology in their
//! language plus the category and error code.
//!
//! v2.1.0: Structured `Response`; rendering moved to `Response::render`
//! v2.5.0: Information replies record the knowledge-base topic so adapters
//! know when a model answer may be tried
//! v2.5.1: Maintenance replies for priced services carry a cost estimate;
//! emergency replies list open nearby shops

use crate::config::{CarxConfig, EmergencyContact, Mechanic};
use crate::cost::{CostCalculator, CostEstimate, QualityTier, RepairType, ShopTier};
use crate::diagnostics::{part_label, DiagnosisResult, DiagnosticTable};
use crate::error::{CarxError, ErrorCategory, Result};
use crate::knowledge::KnowledgeBase;
use crate::language::{Bilingual, Language};
use crate::maintenance::{DrivingCondition, MaintenanceScheduler, ServiceType, VehicleCategory};
use crate::profile::UserProfile;
use crate::query_analyzer::{IntentCategory, QueryAnalysis, QueryAnalyzer};
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const EMERGENCY_BANNER: &str = "🚨 EMERGENCY / طوارئ 🚨";
pub const ERROR_PREFIX: &str = "❌";

const CRITICAL_WARNING: Bilingual = Bilingual::new(
    "🚨 CRITICAL: Stop driving immediately and call emergency services!",
    "🚨 خطر: توقف فوراً واتصل بخدمات الطوارئ!",
);

const NOT_UNDERSTOOD: Bilingual = Bilingual::new(
    "I'm sorry, I didn't fully understand your question. Could you rephrase it?",
    "عذراً، لم أفهم سؤالك بشكل كامل. هل يمكنك إعادة صياغته بطريقة أخرى؟",
);

/// Reply for an empty message, shown in both languages
pub const EMPTY_MESSAGE_PROMPT: &str = "Please enter your question. / يرجى إدخال سؤالك.";

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Normal,
    Emergency,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub kind: ResponseKind,
    pub language: Language,
    pub intent: IntentCategory,
    pub main_content: String,
    pub diagnosis: Option<DiagnosisResult>,
    pub cost_estimate: Option<CostEstimate>,
    /// Due-service reminders, one line each
    pub maintenance_info: Vec<String>,
    pub emergency_contacts: Vec<EmergencyContact>,
    /// Open shops, nearest first
    pub nearby_mechanics: Vec<Mechanic>,
    pub safety_instructions: Vec<String>,
    pub recommendations: Vec<String>,
    pub error_category: Option<ErrorCategory>,
    pub error_code: Option<String>,
    /// Knowledge-base topic that answered an information question
    pub knowledge_topic: Option<String>,
    /// Set when the main content came from the language model
    pub model: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Response {
    fn new(kind: ResponseKind, analysis: &QueryAnalysis, main_content: String) -> Self {
        Self {
            kind,
            language: analysis.language,
            intent: analysis.intent,
            main_content,
            diagnosis: None,
            cost_estimate: None,
            maintenance_info: Vec::new(),
            emergency_contacts: Vec::new(),
            nearby_mechanics: Vec::new(),
            safety_instructions: Vec::new(),
            recommendations: Vec::new(),
            error_category: None,
            error_code: None,
            knowledge_topic: None,
            model: None,
            timestamp: Utc::now(),
        }
    }

    /// An information question nothing in the rule engine could answer
    pub fn needs_model_answer(&self) -> bool {
        self.kind == ResponseKind::Normal
            && self.intent == IntentCategory::Information
            && self.knowledge_topic.is_none()
            && self.model.is_none()
    }

    pub fn apply_model_answer(&mut self, model: &str, answer: String) {
        self.main_content = answer;
        self.model = Some(model.to_string());
    }

    /// Render as chat text
    pub fn render(&self) -> String {
        let lang = self.language;
        match self.kind {
            ResponseKind::Error => format!("{} {}", ERROR_PREFIX, self.main_content),
            ResponseKind::Emergency => {
                let mut out = format!("{}\n{}", EMERGENCY_BANNER, self.main_content);
                let contacts: Vec<String> = self
                    .emergency_contacts
                    .iter()
                    .map(|c| contact_line(c, lang))
                    .collect();
                let mechanics: Vec<String> = self
                    .nearby_mechanics
                    .iter()
                    .map(|m| mechanic_line(m, lang))
                    .collect();
                push_section(
                    &mut out,
                    Bilingual::new("Emergency contacts", "أرقام الطوارئ"),
                    &contacts,
                    lang,
                );
                push_section(
                    &mut out,
                    Bilingual::new("Nearby mechanics", "ورش قريبة"),
                    &mechanics,
                    lang,
                );
                push_section(
                    &mut out,
                    Bilingual::new("Safety instructions", "تعليمات السلامة"),
                    &self.safety_instructions,
                    lang,
                );
                out
            }
            ResponseKind::Normal => {
                let mut out = self.main_content.clone();
                if let Some(diagnosis) = &self.diagnosis {
                    out.push_str(&format!(
                        "\n\n**{}**\n{}",
                        Bilingual::new("Possible causes", "الأسباب المحتملة").get(lang),
                        diagnosis.summary(lang)
                    ));
                }
                if let Some(estimate) = &self.cost_estimate {
                    out.push_str(&format!(
                        "\n\n**{}**\n{}",
                        Bilingual::new("Cost estimate", "تقدير التكلفة").get(lang),
                        estimate.summary(lang)
                    ));
                }
                push_section(
                    &mut out,
                    Bilingual::new("Maintenance reminders", "تذكيرات الصيانة"),
                    &self.maintenance_info,
                    lang,
                );
                push_section(
                    &mut out,
                    Bilingual::new("Recommendations", "توصيات"),
                    &self.recommendations,
                    lang,
                );
                out
            }
        }
    }
}

fn push_section(out: &mut String, heading: Bilingual, lines: &[String], lang: Language) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("\n\n**{}**", heading.get(lang)));
    for line in lines {
        out.push_str(&format!("\n• {}", line));
    }
}

fn contact_line(contact: &EmergencyContact, lang: Language) -> String {
    let label = match (contact.service.as_str(), lang) {
        ("emergency", Language::En) => "Emergency",
        ("emergency", Language::Ar) => "الطوارئ",
        ("roadside", Language::En) => "Roadside assistance",
        ("roadside", Language::Ar) => "المساعدة على الطريق",
        (other, _) => other,
    };
    format!("{}: {}", label, contact.number)
}

fn mechanic_line(mechanic: &Mechanic, lang: Language) -> String {
    let name = mechanic.name.get(lang);
    match lang {
        Language::Ar => format!(
            "{}: {} ({} كم، تقييم {})",
            name, mechanic.phone, mechanic.distance_km, mechanic.rating
        ),
        Language::En => format!(
            "{}: {} ({} km, rating {})",
            name, mechanic.phone, mechanic.distance_km, mechanic.rating
        ),
    }
}

fn apology(category: ErrorCategory) -> Bilingual {
    match category {
        ErrorCategory::General => Bilingual::new(
            "Sorry, an error occurred. Please try again.",
            "عذراً، حدث خطأ. يرجى المحاولة مرة أخرى.",
        ),
        ErrorCategory::Maintenance => Bilingual::new(
            "Unable to process maintenance request.",
            "تعذر معالجة طلب الصيانة.",
        ),
        ErrorCategory::Diagnostic => Bilingual::new(
            "Unable to complete diagnostic analysis.",
            "تعذر إكمال التحليل التشخيصي.",
        ),
        ErrorCategory::Cost => Bilingual::new(
            "Unable to calculate costs at this time.",
            "تعذر حساب التكاليف في الوقت الحالي.",
        ),
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct ResponseGenerator {
    analyzer: QueryAnalyzer,
    diagnostics: DiagnosticTable,
    costs: CostCalculator,
    scheduler: MaintenanceScheduler,
    knowledge: KnowledgeBase,
    contacts: Vec<EmergencyContact>,
    mechanics: Vec<Mechanic>,
}

impl ResponseGenerator {
    pub fn new(config: &CarxConfig) -> Self {
        Self {
            analyzer: QueryAnalyzer::with_policy(config.analyzer.tie_policy),
            diagnostics: DiagnosticTable::new(),
            costs: CostCalculator::new(config.pricing.clone()),
            scheduler: MaintenanceScheduler::new(),
            knowledge: KnowledgeBase::new(),
            contacts: config.emergency.contacts.clone(),
            mechanics: config.emergency.mechanics.clone(),
        }
    }

    pub fn analyzer(&self) -> &QueryAnalyzer {
        &self.analyzer
    }

    pub fn diagnostics(&self) -> &DiagnosticTable {
        &self.diagnostics
    }

    pub fn costs(&self) -> &CostCalculator {
        &self.costs
    }

    pub fn scheduler(&self) -> &MaintenanceScheduler {
        &self.scheduler
    }

    /// Analyze and answer a message
    pub fn generate(&self, text: &str, profile: &UserProfile) -> Response {
        let analysis = self.analyzer.analyze(text);
        self.respond(&analysis, profile)
    }

    pub fn respond(&self, analysis: &QueryAnalysis, profile: &UserProfile) -> Response {
        self.respond_on(analysis, profile, Local::now().date_naive())
    }

    pub fn respond_on(
        &self,
        analysis: &QueryAnalysis,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Response {
        if analysis.is_emergency || analysis.intent == IntentCategory::Emergency {
            return self.emergency_response(analysis);
        }

        let result = match analysis.intent {
            IntentCategory::Diagnostic => self.handle_diagnostic(analysis),
            IntentCategory::Maintenance => self.handle_maintenance(analysis, profile, today),
            IntentCategory::Cost => self.handle_cost(analysis, profile),
            IntentCategory::Information | IntentCategory::Emergency => {
                Ok(self.handle_information(analysis))
            }
        };

        match result {
            Ok(mut response) => {
                if profile.has_due_services() {
                    response.maintenance_info = profile.maintenance_reminders(analysis.language);
                }
                response.recommendations = recommendations(&response, profile);
                response
            }
            Err(e) => self.error_response(&e, analysis),
        }
    }

    /// Convert an error into the reply the user sees
    pub fn error_response(&self, error: &CarxError, analysis: &QueryAnalysis) -> Response {
        tracing::error!(
            "{} while answering {:?}: {}",
            error.code(),
            analysis.text,
            error
        );
        let category = error.category();
        let mut response = Response::new(
            ResponseKind::Error,
            analysis,
            apology(category).get(analysis.language).to_string(),
        );
        response.error_category = Some(category);
        response.error_code = Some(error.code().to_string());
        response
    }

    fn emergency_response(&self, analysis: &QueryAnalysis) -> Response {
        tracing::warn!("Emergency situation detected: {}", analysis.text);
        let lang = analysis.language;
        let mut response = Response::new(
            ResponseKind::Emergency,
            analysis,
            CRITICAL_WARNING.get(lang).to_string(),
        );
        response.emergency_contacts = self.contacts.clone();

        let mut mechanics: Vec<Mechanic> = self
            .mechanics
            .iter()
            .filter(|m| m.open_now)
            .cloned()
            .collect();
        mechanics.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        response.nearby_mechanics = mechanics;

        response.safety_instructions = safety_instructions(&analysis.text, lang);
        response
    }

    // ========================================================================
    // Intent Handlers
    // ========================================================================

    fn handle_diagnostic(&self, analysis: &QueryAnalysis) -> Result<Response> {
        let lang = analysis.language;
        let Some(path) = self.diagnostics.identify(&analysis.text) else {
            return Err(CarxError::Diagnostic(format!(
                "No known symptom in: {}",
                analysis.text
            )));
        };
        let diagnosis = self.diagnostics.diagnose_path(&path)?;

        let intro = Bilingual::new(
            "Based on your description, these are the most likely causes:",
            "بناءً على وصفك، هذه هي الأسباب الأكثر احتمالاً:",
        );
        let mut response =
            Response::new(ResponseKind::Normal, analysis, intro.get(lang).to_string());
        response.diagnosis = Some(diagnosis);
        Ok(response)
    }

    fn handle_maintenance(
        &self,
        analysis: &QueryAnalysis,
        profile: &UserProfile,
        today: NaiveDate,
    ) -> Result<Response> {
        let lang = analysis.language;
        let service = ServiceType::identify(&analysis.text).unwrap_or(ServiceType::OilChange);

        let mut lines = Vec::new();
        if profile.vehicles.is_empty() {
            let projection = self.scheduler.next_service_on(
                service,
                0,
                VehicleCategory::Economy,
                DrivingCondition::Normal,
                today,
            )?;
            let intervals = service.intervals();
            let label = service.label();
            lines.push(match lang {
                Language::Ar => format!(
                    "{}: كل {} كم في الظروف الحالية، أو كل {} شهر",
                    label.get(lang),
                    projection.km_remaining,
                    months(intervals.time)
                ),
                Language::En => format!(
                    "{}: every {} km under current conditions, or every {}",
                    label.get(lang),
                    projection.km_remaining,
                    intervals.time
                ),
            });
            if let Some(severe) = intervals.severe {
                lines.push(match lang {
                    Language::Ar => format!("في الظروف القاسية: كل {} كم", severe),
                    Language::En => format!("Severe driving: every {} km", severe),
                });
            }
        } else {
            for (id, vehicle) in &profile.vehicles {
                let projection = self.scheduler.next_service_on(
                    service,
                    vehicle.mileage,
                    vehicle.category(),
                    vehicle.driving_condition,
                    today,
                )?;
                lines.push(format!(
                    "{} {} ({}): {}",
                    vehicle.make,
                    vehicle.model,
                    id,
                    projection.summary(lang)
                ));
            }
        }

        let mut response = Response::new(ResponseKind::Normal, analysis, lines.join("\n"));
        // Services that are also priced repairs carry an estimate
        if let Some(repair) = RepairType::identify(&analysis.text) {
            response.cost_estimate = Some(self.costs.estimate_repair(
                repair,
                profile.preferences.parts_quality,
                analysis.is_emergency,
                ShopTier::Standard,
            )?);
        }
        Ok(response)
    }

    fn handle_cost(&self, analysis: &QueryAnalysis, profile: &UserProfile) -> Result<Response> {
        let lang = analysis.language;
        let quality = profile.preferences.parts_quality;
        let emergency = analysis.is_emergency;

        match RepairType::identify(&analysis.text) {
            Some(repair) => {
                let estimate = self
                    .costs
                    .estimate_repair(repair, quality, emergency, ShopTier::Standard)?;
                let intro = match lang {
                    Language::Ar => format!(
                        "تقدير تكلفة {} بقطع غيار {}:",
                        repair.label().get(lang),
                        quality_label(quality).get(lang)
                    ),
                    Language::En => format!(
                        "Estimate for {} with {} parts:",
                        repair.label().get(lang),
                        quality_label(quality).get(lang)
                    ),
                };
                let mut response = Response::new(ResponseKind::Normal, analysis, intro);
                response.cost_estimate = Some(estimate);
                Ok(response)
            }
            None => {
                let heading = Bilingual::new(
                    "Typical prices at a standard shop:",
                    "الأسعار المعتادة في ورشة عادية:",
                );
                let mut lines = vec![heading.get(lang).to_string()];
                for repair in RepairType::ALL {
                    let estimate = self
                        .costs
                        .estimate_repair(repair, quality, emergency, ShopTier::Standard)?;
                    lines.push(format!("• {}", estimate.summary(lang)));
                }
                let content = lines.join("\n");
                Ok(Response::new(ResponseKind::Normal, analysis, content))
            }
        }
    }

    fn handle_information(&self, analysis: &QueryAnalysis) -> Response {
        let lang = analysis.language;
        match self.knowledge.lookup(&analysis.text) {
            Some(entry) => {
                let advice = entry.advice.get(lang).to_string();
                let mut response = Response::new(ResponseKind::Normal, analysis, advice);
                response.knowledge_topic = Some(entry.topic.to_string());
                response
            }
            None => {
                let text = NOT_UNDERSTOOD.get(lang).to_string();
                Response::new(ResponseKind::Normal, analysis, text)
            }
        }
    }
}

fn quality_label(quality: QualityTier) -> Bilingual {
    match quality {
        QualityTier::Economy => Bilingual::new("economy", "اقتصادية"),
        QualityTier::Standard => Bilingual::new("standard", "عادية"),
        QualityTier::Premium => Bilingual::new("premium", "ممتازة"),
    }
}

/// "6 months" -> "6"
fn months(time: &str) -> &str {
    time.split_whitespace().next().unwrap_or(time)
}

fn safety_instructions(text: &str, lang: Language) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut items: Vec<Bilingual> = Vec::new();

    if ["smoke", "fire", "دخان", "حريق"]
        .iter()
        .any(|k| lowered.contains(k))
    {
        items.push(Bilingual::new(
            "Turn off the engine, get everyone out and stay well away from the car.",
            "أطفئ المحرك وأخرج الجميع من السيارة وابتعد عنها مسافة آمنة.",
        ));
    }
    if ["accident", "حادث"].iter().any(|k| lowered.contains(k)) {
        items.push(Bilingual::new(
            "Check everyone for injuries before anything else.",
            "تأكد من سلامة الجميع قبل أي شيء آخر.",
        ));
    }
    items.push(Bilingual::new(
        "Turn on your hazard lights.",
        "شغّل أنوار الانتظار (الفلاشر).",
    ));
    items.push(Bilingual::new(
        "Move to the road shoulder only if it is safe to do so.",
        "تحرك إلى جانب الطريق فقط إذا كان ذلك آمناً.",
    ));
    items.push(Bilingual::new(
        "Wait behind the guardrail, not inside the car.",
        "انتظر خلف الحاجز وليس داخل السيارة.",
    ));

    items.into_iter().map(|b| b.get(lang).to_string()).collect()
}

fn recommendations(response: &Response, profile: &UserProfile) -> Vec<String> {
    let lang = response.language;
    let mut out: Vec<Bilingual> = Vec::new();

    match response.intent {
        IntentCategory::Diagnostic => {
            out.push(Bilingual::new(
                "Start with a computer scan (300-600 EGP) before replacing parts.",
                "ابدأ بفحص كمبيوتر (300-600 جنيه) قبل تغيير أي قطع.",
            ));
        }
        IntentCategory::Maintenance => {
            out.push(Bilingual::new(
                "Keep a record of every service with the mileage.",
                "سجّل كل صيانة مع قراءة العداد.",
            ));
            out.push(Bilingual::new(
                "In summer, check oil and coolant levels every two weeks.",
                "في الصيف، افحص مستوى الزيت والمياه كل أسبوعين.",
            ));
        }
        IntentCategory::Cost => {
            out.push(Bilingual::new(
                "Compare quotes from at least two shops.",
                "قارن الأسعار بين ورشتين على الأقل.",
            ));
            if profile.preferences.parts_quality == QualityTier::Economy {
                out.push(Bilingual::new(
                    "Economy parts cost less now but wear out sooner.",
                    "القطع الاقتصادية أرخص الآن لكنها تستهلك أسرع.",
                ));
            }
        }
        IntentCategory::Information | IntentCategory::Emergency => {
            if response.knowledge_topic.is_none() {
                out.push(Bilingual::new(
                    "Describe a symptom, such as a noise or a warning light, to get a diagnosis.",
                    "صف العَرَض، مثل صوت أو لمبة تحذير، للحصول على تشخيص.",
                ));
            }
        }
    }

    let mut lines: Vec<String> = out.into_iter().map(|b| b.get(lang).to_string()).collect();

    // Most likely part, right after the scan advice
    if let Some(first) = response
        .diagnosis
        .as_ref()
        .and_then(|d| d.possible_causes.first())
    {
        let part = part_label(&first.part);
        lines.push(match lang {
            Language::Ar => format!("افحص {} أولاً، فهو السبب الأكثر احتمالاً.", part.get(lang)),
            Language::En => format!(
                "Check the {} first, it is the most likely cause.",
                part.get(lang).to_lowercase()
            ),
        });
    }

    if !response.maintenance_info.is_empty() {
        lines.push(
            Bilingual::new(
                "Book your due services soon.",
                "احجز مواعيد الصيانة المستحقة قريباً.",
            )
            .get(lang)
            .to_string(),
        );
    }
    lines
}
