// 📚 Fixed catalogs - tribes, families, residential areas, institutions
// These lists are the closed vocabularies the forms and generator draw from.

/// Tribes in display order. The first one is the distinguished tribe whose
/// families are tracked by name (see `FAMILY_NAMES`).
pub const TRIBES: [&str; 8] = [
    "انشاشبة",
    "ات بنور",
    "ات بلفع",
    "ات عابوا",
    "لعفافرة",
    "ابن ناصر",
    "عمي سعيد",
    "حل عينهم",
];

/// Tribe whose members are spread across `FAMILY_NAMES`
pub const DISTINGUISHED_TRIBE: &str = TRIBES[0];

/// Family names of the distinguished tribe
pub const FAMILY_NAMES: [&str; 24] = [
    "ابن عبد الله",
    "ابو الصديق",
    "اشقبقب",
    "بابا سيدي",
    "بابنات",
    "بحامد",
    "بكاي",
    "بوسربة",
    "جوهري",
    "حجاج",
    "خن",
    "دبوز",
    "دونيت",
    "شخار",
    "طلالة",
    "عبد العزيز",
    "عمر ايوب",
    "فراجي",
    "قراري",
    "كاسي و صالح",
    "ملال",
    "موسلمال",
    "النعجة",
    "الواهج",
];

pub const RESIDENTIAL_AREAS: [&str; 15] = [
    "حي كاف حمودة",
    "حي كاف لوتال",
    "حي بابا السعد",
    "حي صرعاف",
    "حي فرهوط",
    "حي اغرم",
    "حي بوطارة",
    "حي بربورة",
    "حي كروش",
    "حي الخالف",
    "حي الزرقي",
    "حي باسة",
    "حي الشيخ عامر المركزي",
    "حي عامر 2",
    "حي الشيخ عامر الشرقي",
];

pub const MALE_FIRST_NAMES: [&str; 30] = [
    "محمد", "أحمد", "علي", "عبد الله", "عبد الرحمن", "يوسف", "خالد", "عمر", "إبراهيم", "مصطفى",
    "سعيد", "حسن", "حسين", "عبد العزيز", "عبد الكريم", "زكريا", "بلال", "أنس", "ياسين", "أيمن",
    "عادل", "كريم", "رشيد", "سليمان", "طارق", "جمال", "نبيل", "وليد", "هشام", "فيصل",
];

pub const FEMALE_FIRST_NAMES: [&str; 30] = [
    "فاطمة", "عائشة", "مريم", "خديجة", "أمينة", "سارة", "نور", "هدى", "سلمى", "ليلى",
    "زينب", "سمية", "حليمة", "نادية", "لطيفة", "حنان", "سعاد", "نجاة", "رحمة", "صفية",
    "جميلة", "نعيمة", "سهام", "إيمان", "أسماء", "بشرى", "منى", "هناء", "وفاء", "ياسمين",
];

/// Places of study offered to generated students
pub const STUDY_PLACES: [&str; 10] = [
    "جامعة غرداية",
    "المدرسة العليا للأساتذة",
    "معهد العلوم الإسلامية",
    "كلية الطب",
    "كلية الهندسة",
    "كلية العلوم",
    "كلية الآداب",
    "ثانوية الخوارزمي",
    "ثانوية ابن سينا",
    "مدرسة النور الابتدائية",
];

/// Workplaces offered to generated employed records
pub const WORK_PLACES: [&str; 13] = [
    "شركة سوناطراك",
    "بلدية غرداية",
    "مستشفى غرداية المركزي",
    "مديرية التربية",
    "مديرية الصحة",
    "البريد المركزي",
    "بنك الجزائر",
    "شركة الكهرباء والغاز",
    "مديرية الضرائب",
    "مديرية التجارة",
    "قطاع خاص",
    "تجارة",
    "حرفي",
];

pub const PHONE_PREFIXES: [&str; 3] = ["05", "06", "07"];

pub fn is_known_tribe(name: &str) -> bool {
    TRIBES.contains(&name)
}

pub fn is_known_area(name: &str) -> bool {
    RESIDENTIAL_AREAS.contains(&name)
}
