use lazy_static::lazy_static;

// Static gate tables covering the platform's five languages: English,
// Malay, Nepali, Bengali, Burmese. Membership here is the contract; a
// keyword listed below must always cause acceptance.

lazy_static! {
    /// Greeting and question-starter tokens. Short messages (three words or
    /// fewer) that begin with one of these are accepted without a keyword
    /// match, so "hi", "apa khabar" and "नमस्ते" reach the chatbot.
    static ref GREETING_TOKENS: Vec<&'static str> = vec![
        // English
        "hi", "hello", "hey", "good morning", "good afternoon", "good evening",
        "what", "how", "who", "when", "where", "why", "which", "can", "could",
        "is", "are", "do", "does", "help", "thanks", "thank you",
        // Malay
        "hai", "helo", "selamat", "apa", "bagaimana", "macam mana", "siapa",
        "bila", "di mana", "kenapa", "mengapa", "boleh", "adakah", "tolong",
        "terima kasih",
        // Nepali
        "नमस्ते", "नमस्कार", "के", "कसरी", "को", "कहिले", "कहाँ", "किन",
        "सक्छु", "मद्दत", "धन्यवाद",
        // Bengali
        "হ্যালো", "সালাম", "আসসালামু", "কি", "কী", "কিভাবে", "কে", "কখন",
        "কোথায়", "কেন", "পারি", "সাহায্য", "ধন্যবাদ",
        // Burmese
        "မင်္ဂလာပါ", "ဟယ်လို", "ဘာ", "ဘယ်လို", "ဘယ်သူ", "ဘယ်တော့",
        "ဘယ်မှာ", "ဘာကြောင့်", "ကူညီ", "ကျေးဇူး",
    ];

    /// Domain keywords: labor rights, wages, documents, safety and
    /// statistics vocabulary. A question containing any of these is
    /// in-domain.
    static ref DOMAIN_KEYWORDS: Vec<&'static str> = vec![
        // English — wages and money
        "salary", "wage", "wages", "pay", "payment", "paid", "overtime",
        "minimum wage", "deduction", "bonus", "allowance", "levy",
        "compensation", "backpay", "unpaid",
        // English — employment terms
        "contract", "employer", "employment", "employee", "worker", "workers",
        "labour", "labor", "job", "work permit", "termination", "dismissal",
        "dismissed", "resign", "resignation", "probation", "recruitment",
        "agent fee", "agency",
        // English — leave and hours
        "leave", "annual leave", "sick leave", "maternity", "rest day",
        "public holiday", "working hours", "work hours", "shift",
        // English — documents
        "passport", "visa", "permit", "document", "documents", "fomema",
        "medical check", "insurance", "socso", "perkeso", "i-kad",
        // English — safety and abuse
        "safety", "accident", "injury", "injured", "abuse", "exploitation",
        "trafficking", "forced labour", "forced labor", "harassment",
        "complaint", "grievance",
        // English — help and statistics
        "embassy", "legal aid", "labour department", "labour court",
        "immigration", "statistics", "migrant", "migrants", "migrant worker",
        "foreign worker", "how many workers",
        // Malay
        "gaji", "upah", "bayaran", "kerja lebih masa", "gaji minimum",
        "potongan", "elaun", "levi", "pampasan", "tunggakan gaji",
        "kontrak", "majikan", "pekerjaan", "pekerja", "buruh", "kerja",
        "permit kerja", "penamatan", "buang kerja", "berhenti kerja",
        "tempoh percubaan", "agensi pekerjaan", "yuran ejen",
        "cuti", "cuti tahunan", "cuti sakit", "cuti bersalin", "hari rehat",
        "cuti umum", "waktu kerja", "syif",
        "pasport", "visa", "dokumen", "pemeriksaan kesihatan", "insurans",
        "perkeso",
        "keselamatan", "kemalangan", "kecederaan", "penderaan",
        "eksploitasi", "pemerdagangan", "buruh paksa", "gangguan", "aduan",
        "kedutaan", "bantuan guaman", "jabatan tenaga kerja", "mahkamah buruh",
        "imigresen", "statistik", "pekerja asing", "pekerja migran",
        "berapa ramai pekerja",
        // Nepali
        "तलब", "ज्याला", "भुक्तानी", "ओभरटाइम", "न्यूनतम ज्याला", "कटौती",
        "बोनस", "भत्ता", "क्षतिपूर्ति",
        "करार", "रोजगारदाता", "रोजगार", "कामदार", "श्रमिक", "श्रम", "काम",
        "वर्क परमिट", "निष्कासन", "राजीनामा", "एजेन्ट शुल्क",
        "बिदा", "वार्षिक बिदा", "बिरामी बिदा", "प्रसूति बिदा", "आराम दिन",
        "सार्वजनिक बिदा", "काम गर्ने समय",
        "राहदानी", "भिसा", "कागजात", "स्वास्थ्य जाँच", "बीमा",
        "सुरक्षा", "दुर्घटना", "चोटपटक", "दुर्व्यवहार", "शोषण",
        "बेचबिखन", "जबरजस्ती श्रम", "उत्पीडन", "उजुरी",
        "दूतावास", "कानुनी सहायता", "श्रम विभाग", "अध्यागमन", "तथ्याङ्क",
        "आप्रवासी कामदार", "विदेशी कामदार", "कति कामदार",
        // Bengali
        "বেতন", "মজুরি", "পেমেন্ট", "ওভারটাইম", "ন্যূনতম মজুরি", "কর্তন",
        "বোনাস", "ভাতা", "ক্ষতিপূরণ", "বকেয়া বেতন",
        "চুক্তি", "নিয়োগকর্তা", "চাকরি", "শ্রমিক", "কর্মী", "শ্রম", "কাজ",
        "ওয়ার্ক পারমিট", "বরখাস্ত", "পদত্যাগ", "এজেন্ট ফি",
        "ছুটি", "বার্ষিক ছুটি", "অসুস্থতার ছুটি", "মাতৃত্বকালীন ছুটি",
        "বিশ্রামের দিন", "সরকারি ছুটি", "কাজের সময়",
        "পাসপোর্ট", "ভিসা", "কাগজপত্র", "স্বাস্থ্য পরীক্ষা", "বীমা",
        "নিরাপত্তা", "দুর্ঘটনা", "আঘাত", "নির্যাতন", "শোষণ", "পাচার",
        "জোরপূর্বক শ্রম", "হয়রানি", "অভিযোগ",
        "দূতাবাস", "আইনি সহায়তা", "শ্রম বিভাগ", "অভিবাসন", "পরিসংখ্যান",
        "অভিবাসী শ্রমিক", "বিদেশি শ্রমিক", "কতজন শ্রমিক",
        // Burmese
        "လစာ", "လုပ်ခ", "ငွေပေးချေ", "အချိန်ပို", "အနည်းဆုံးလုပ်ခ",
        "ဖြတ်တောက်", "ဆုကြေး", "ထောက်ပံ့ကြေး", "လျော်ကြေး",
        "စာချုပ်", "အလုပ်ရှင်", "အလုပ်", "အလုပ်သမား", "လုပ်သား",
        "အလုပ်ပါမစ်", "ထုတ်ပယ်", "နုတ်ထွက်", "အေးဂျင့်ကြေး",
        "ခွင့်", "နှစ်ပတ်လည်ခွင့်", "နာမကျန်းခွင့်", "မီးဖွားခွင့်",
        "နားရက်", "အများပြည်သူရုံးပိတ်ရက်", "အလုပ်ချိန်",
        "နိုင်ငံကူးလက်မှတ်", "ဗီဇာ", "ပါမစ်", "စာရွက်စာတမ်း",
        "ကျန်းမာရေးစစ်ဆေး", "အာမခံ",
        "ဘေးကင်းရေး", "မတော်တဆမှု", "ဒဏ်ရာ", "နှိပ်စက်", "ခေါင်းပုံဖြတ်",
        "လူကုန်ကူး", "အဓမ္မလုပ်အား", "နှောင့်ယှက်", "တိုင်ကြား",
        "သံရုံး", "ဥပဒေအကူအညီ", "အလုပ်သမားဌာန", "လူဝင်မှုကြီးကြပ်ရေး",
        "စာရင်းအင်း", "ရွှေ့ပြောင်းအလုပ်သမား", "နိုင်ငံခြားအလုပ်သမား",
    ];
}

/// Keyword gate run before any retrieval or LLM work. Pure function of the
/// static tables and the input; false negatives are tolerated (the user can
/// rephrase), false positives only cost a retrieval that finds nothing.
pub fn is_relevant(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }

    let word_count = normalized.split_whitespace().count();
    if word_count <= 3
        && GREETING_TOKENS
            .iter()
            .any(|token| normalized.starts_with(token))
    {
        return true;
    }

    DOMAIN_KEYWORDS
        .iter()
        .any(|keyword| normalized.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_greetings_accepted() {
        assert!(is_relevant("Hi"));
        assert!(is_relevant("hello there"));
        assert!(is_relevant("Apa khabar?"));
        assert!(is_relevant("नमस्ते"));
        assert!(is_relevant("কি অবস্থা"));
        assert!(is_relevant("မင်္ဂလာပါ"));
    }

    #[test]
    fn test_keyword_acceptance_across_languages() {
        assert!(is_relevant("My employer has not paid my salary for two months"));
        assert!(is_relevant("Majikan saya tidak bayar gaji saya"));
        assert!(is_relevant("मेरो तलब कहिले पाउँछु भनेर जान्न चाहन्छु है त्यसैले सोधेको"));
        assert!(is_relevant("আমার নিয়োগকর্তা আমার পাসপোর্ট রেখে দিয়েছেন এটা কি বৈধ"));
        assert!(is_relevant("ကျွန်တော့် အလုပ်ရှင်က လစာမပေးသေးပါဘူး ဘာလုပ်ရမလဲ"));
    }

    #[test]
    fn test_short_keyword_question_accepted_without_greeting() {
        // Two words, no greeting prefix, but contains a domain keyword.
        assert!(is_relevant("gaji minimum"));
        assert!(is_relevant("overtime rate"));
    }

    #[test]
    fn test_out_of_domain_rejected() {
        assert!(!is_relevant(
            "Tell me your favourite football team and the latest match score please"
        ));
        assert!(!is_relevant("resepi nasi lemak yang paling sedap ialah sesuatu rahsia besar"));
        assert!(!is_relevant(""));
        assert!(!is_relevant("   "));
    }
}
