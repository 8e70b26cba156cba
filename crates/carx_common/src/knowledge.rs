//! Knowledge Base - bilingual car care guides
//!
//! Pure data. Each entry is keyed by a set of synonyms in both languages;
//! a message matches an entry when it contains any synonym.

use crate::language::Bilingual;

pub struct KnowledgeEntry {
    /// Stable topic id
    pub topic: &'static str,
    pub synonyms: &'static [&'static str],
    pub advice: Bilingual,
}

static ENTRIES: &[KnowledgeEntry] = &[
    KnowledgeEntry {
        topic: "engine_oil",
        synonyms: &[
            "تغيير زيت الموتور",
            "change engine oil",
            "oil change",
            "engine oil",
            "متى اغير الزيت",
            "كل قد ايه اغير زيت",
            "oil service",
            "خدمة زيت",
        ],
        advice: Bilingual::new(
            "🔧 **Engine Oil Service Guide (Egypt)**\n\
• Change intervals:\n\
  - City driving: every 5,000 km\n\
  - Highway driving: every 7,500 km\n\
  - Severe conditions: every 3,000-4,000 km\n\
  - Or every 6 months, whichever comes first\n\
• Oil prices (4L):\n\
  - Full synthetic: 850-1150 EGP\n\
  - Semi-synthetic: 600-900 EGP\n\
  - Conventional: 300-550 EGP\n\
• Service total including filter and labor: 600-1700 EGP\n\
• Change immediately if the oil is black, the pressure light is on,\n\
  or the level drops quickly.\n\
• Use synthetic oil for Egypt's heat and check the level every 2 weeks.",
            "🔧 **دليل خدمة زيت المحرك (مصر)**\n\
• مواعيد التغيير:\n\
  - داخل المدينة: كل 5000 كم\n\
  - على الطرق السريعة: كل 7500 كم\n\
  - الظروف القاسية: كل 3000-4000 كم\n\
  - أو كل 6 شهور، أيهما يأتي أولاً\n\
• أسعار الزيت (4 لتر):\n\
  - تخليقي كامل: 850-1150 جنيه\n\
  - نصف تخليقي: 600-900 جنيه\n\
  - عادي: 300-550 جنيه\n\
• إجمالي الخدمة شامل الفلتر والمصنعية: 600-1700 جنيه\n\
• غيّر الزيت فوراً إذا كان لونه أسود أو أضاءت لمبة الضغط\n\
  أو انخفض المستوى بسرعة.\n\
• استخدم زيت تخليقي لحرارة مصر وافحص المستوى كل أسبوعين.",
        ),
    },
    KnowledgeEntry {
        topic: "engine",
        synonyms: &[
            "مشاكل المحرك",
            "engine problems",
            "محرك",
            "engine performance",
            "قوة المحرك",
            "engine power",
            "ضعف المحرك",
            "won't start",
            "مش عايزة تدور",
        ],
        advice: Bilingual::new(
            "🔍 **Engine Diagnostic Guide (Egypt)**\n\
• Starting issues:\n\
  - No start: battery, starter or fuel pump (1200-3700 EGP)\n\
  - Hard start: spark plugs or fuel system (400-2000 EGP)\n\
• Running problems:\n\
  - Rough idle: plugs, injectors or MAF sensor (500-3000 EGP)\n\
  - Misfire: coils, plugs or compression (450-4000 EGP)\n\
• Noises:\n\
  - Ticking: valves or low oil (500-3000 EGP)\n\
  - Knocking: bearings or timing (2000-8000 EGP)\n\
• A computer scan costs 300-600 EGP and is the right first step.\n\
• Stop driving if the engine knocks and check the oil immediately.",
            "🔍 **دليل تشخيص المحرك (مصر)**\n\
• مشاكل التشغيل:\n\
  - عدم التشغيل: بطارية أو مارش أو طرمبة (1200-3700 جنيه)\n\
  - صعوبة التشغيل: بوجيهات أو نظام الوقود (400-2000 جنيه)\n\
• مشاكل أثناء الدوران:\n\
  - رعشة في السلانسيه: بوجيهات أو بخاخات أو حساس هواء (500-3000 جنيه)\n\
  - تقطيع: موبينات أو بوجيهات أو ضغط (450-4000 جنيه)\n\
• الأصوات:\n\
  - تكتكة: تلابيه أو نقص زيت (500-3000 جنيه)\n\
  - خبط: سبائك أو توقيت (2000-8000 جنيه)\n\
• الفحص بالكمبيوتر يتكلف 300-600 جنيه وهو أول خطوة صحيحة.\n\
• توقف عن القيادة إذا سمعت خبط وافحص الزيت فوراً.",
        ),
    },
    KnowledgeEntry {
        topic: "transmission",
        synonyms: &[
            "مشاكل الفتيس",
            "transmission problems",
            "فتيس",
            "gear problems",
            "ناقل الحركة",
            "transmission",
            "gearbox",
        ],
        advice: Bilingual::new(
            "⚙️ **Transmission Guide (Egypt)**\n\
• Automatic fluid: every 60,000 km (40,000 km severe), 1500-3000 EGP\n\
• Manual gear oil: every 80,000 km, 600-1200 EGP\n\
• Warning signs: slipping, delayed engagement, burning smell, whining.\n\
• Clutch replacement (manual): 3000-7000 EGP\n\
• Never tow an automatic on its driven wheels.",
            "⚙️ **دليل الفتيس (مصر)**\n\
• زيت الفتيس الأوتوماتيك: كل 60000 كم (40000 كم في الظروف القاسية)، 1500-3000 جنيه\n\
• زيت الفتيس المانيوال: كل 80000 كم، 600-1200 جنيه\n\
• علامات الخطر: تزحلق، تأخير في التعشيق، ريحة حريق، صفير.\n\
• تغيير الدبرياج (مانيوال): 3000-7000 جنيه\n\
• لا تسحب سيارة أوتوماتيك على عجلات الجر.",
        ),
    },
    KnowledgeEntry {
        topic: "brakes",
        synonyms: &[
            "مشاكل الفرامل",
            "brake problems",
            "brake system",
            "فرامل",
            "صوت فرامل",
            "brake noise",
            "brakes",
        ],
        advice: Bilingual::new(
            "🛑 **Brake System Guide (Egypt)**\n\
• Front pads: every 30,000-50,000 km, 600-1500 EGP\n\
• Discs: machine or replace every 60,000-80,000 km, 1200-3000 EGP\n\
• Brake fluid: every 45,000 km or 2 years\n\
• Warning signs: squealing, grinding, soft pedal, pulling to one side.\n\
• Replace pads in axle pairs and use good quality parts.",
            "🛑 **دليل الفرامل (مصر)**\n\
• تيل الفرامل الأمامي: كل 30000-50000 كم، 600-1500 جنيه\n\
• الطنابير: خراطة أو تغيير كل 60000-80000 كم، 1200-3000 جنيه\n\
• زيت الفرامل: كل 45000 كم أو سنتين\n\
• علامات الخطر: صفير، صوت احتكاك، دواسة لينة، السيارة تشد لجنب.\n\
• غيّر التيل بالأزواج واستخدم قطع جيدة.",
        ),
    },
];

/// Static lookup over the bilingual guides
pub struct KnowledgeBase {
    entries: &'static [KnowledgeEntry],
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self { entries: ENTRIES }
    }

    /// First entry with a synonym contained in `text`
    pub fn lookup(&self, text: &str) -> Option<&'static KnowledgeEntry> {
        let lowered = text.to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.synonyms.iter().any(|s| lowered.contains(s)))
    }

    pub fn topics(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|e| e.topic)
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}
